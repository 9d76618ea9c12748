use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::ip::IpNextHeaderProtocol;
use pnet::packet::ipv4::{Ipv4Packet, MutableIpv4Packet, checksum};

pub const IPV4_HDR_LEN: usize = 20;

/// Writes a 20 byte IPv4 header at the start of `buf`.
///
/// An unspecified `src_addr` is left for the kernel to fill in on raw sockets.
pub fn create_ipv4_header(
    buf: &mut [u8],
    total_length: u16,
    nxt_ptc: IpNextHeaderProtocol,
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
) -> anyhow::Result<()> {
    let mut ipv4 = MutableIpv4Packet::new(&mut buf[..IPV4_HDR_LEN]).context("creating ipv4 packet")?;
    ipv4.set_version(4);
    ipv4.set_header_length(5); // 5 × 32 bits, no options
    ipv4.set_dscp(0);
    ipv4.set_ecn(0);
    ipv4.set_total_length(total_length);
    ipv4.set_identification(rand::random());
    ipv4.set_flags(2); // Do not fragment (010)
    ipv4.set_fragment_offset(0);
    ipv4.set_ttl(64);
    ipv4.set_next_level_protocol(nxt_ptc);
    ipv4.set_source(src_addr);
    ipv4.set_destination(dst_addr);

    ipv4.set_checksum(0);
    let ipv4_imm = ipv4.to_immutable();
    let ipv4_pkt = Ipv4Packet::new(ipv4_imm.packet()).context("transforming ipv4 to packet")?;
    let csm = checksum(&ipv4_pkt);
    ipv4.set_checksum(csm);
    Ok(())
}
