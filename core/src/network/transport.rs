use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::{self, TransportChannelType, TransportReceiver, TransportSender};

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer3(IpNextHeaderProtocols::Icmp);

/// Opens a raw IPv4 channel that carries full ICMP datagrams, headers included.
///
/// Needs root (or `CAP_NET_RAW`).
pub fn open_icmp_channel() -> anyhow::Result<(TransportSender, TransportReceiver)> {
    let (tx, rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)?;
    Ok((tx, rx))
}
