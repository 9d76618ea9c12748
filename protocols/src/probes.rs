/// A payload written to an open connection in the hope of provoking a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub name: &'static str,
    pub payload: &'static [u8],
}

/// Probes sent, in this order, over a single connection while identifying a service.
pub const SERVICE_PROBES: [Probe; 4] = [
    Probe {
        name: "http-head",
        payload: b"HEAD / HTTP/1.0\r\n\r\n",
    },
    Probe {
        name: "ssh-version",
        payload: b"SSH-2.0-OpenSSH_8.2p1\r\n",
    },
    Probe {
        name: "help",
        payload: b"HELP\r\n",
    },
    Probe {
        name: "ping",
        payload: b"PING\r\n",
    },
];

/// Sent once per port when grepping responses for OS tokens.
pub const OS_BANNER_PROBE: Probe = Probe {
    name: "http-head",
    payload: b"HEAD / HTTP/1.0\r\n\r\n",
};

/// Upper bound for a single response read.
pub const READ_BUFFER_LEN: usize = 1024;
