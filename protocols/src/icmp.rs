//! ICMP echo packets for reading a host's initial TTL.

use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes, checksum};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;

use crate::ipv4::{self, IPV4_HDR_LEN};

pub const ICMP_ECHO_HDR_LEN: usize = 8;
const ECHO_PAYLOAD: &[u8] = b"sonar-ttl-probe!";

/// Identifies one echo exchange so unrelated replies can be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoId {
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoId {
    pub fn random() -> Self {
        Self {
            identifier: rand::random(),
            sequence: 1,
        }
    }
}

/// Builds a complete IPv4 + ICMP echo request addressed to `dst_addr`.
pub fn create_echo_request(dst_addr: Ipv4Addr, id: EchoId) -> anyhow::Result<Vec<u8>> {
    let total_len: usize = IPV4_HDR_LEN + ICMP_ECHO_HDR_LEN + ECHO_PAYLOAD.len();
    let mut buf: Vec<u8> = vec![0u8; total_len];

    {
        let mut echo = MutableEchoRequestPacket::new(&mut buf[IPV4_HDR_LEN..])
            .context("creating echo request packet")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode(0));
        echo.set_identifier(id.identifier);
        echo.set_sequence_number(id.sequence);
        echo.set_payload(ECHO_PAYLOAD);
        echo.set_checksum(0);
    }

    let csm = {
        let icmp_pkt = IcmpPacket::new(&buf[IPV4_HDR_LEN..]).context("creating icmp packet")?;
        checksum(&icmp_pkt)
    };
    MutableEchoRequestPacket::new(&mut buf[IPV4_HDR_LEN..])
        .context("creating echo request packet")?
        .set_checksum(csm);

    ipv4::create_ipv4_header(
        &mut buf,
        total_len as u16,
        IpNextHeaderProtocols::Icmp,
        Ipv4Addr::UNSPECIFIED,
        dst_addr,
    )?;
    Ok(buf)
}

/// Returns the TTL of `packet` if it is the echo reply from `from` answering `id`.
pub fn reply_ttl(packet: &Ipv4Packet, from: Ipv4Addr, id: EchoId) -> Option<u8> {
    if packet.get_source() != from
        || packet.get_next_level_protocol() != IpNextHeaderProtocols::Icmp
    {
        return None;
    }

    let reply = EchoReplyPacket::new(packet.payload())?;
    let is_ours = reply.get_icmp_type() == IcmpTypes::EchoReply
        && reply.get_identifier() == id.identifier
        && reply.get_sequence_number() == id.sequence;

    is_ours.then(|| packet.get_ttl())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
