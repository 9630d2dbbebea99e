//! Network infrastructure: implements `PortProbe` on loopback.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};

use crate::application::ports::PortProbe;
use crate::domain::PortAvailability;

/// How long a connect attempt may take before the port counts as silent.
pub const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Production port probe.
///
/// A port is in use when something accepts a connection on it, or when
/// binding `127.0.0.1:<port>` fails with `AddrInUse`. The probe listener is
/// closed immediately, so nothing is reserved.
pub struct LoopbackPortProbe;

impl PortProbe for LoopbackPortProbe {
    async fn check(&self, port: u16) -> Result<PortAvailability> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        if let Ok(Ok(_stream)) = tokio::time::timeout(CONNECT_PROBE_TIMEOUT, TcpStream::connect(addr)).await {
            return Ok(PortAvailability::InUse);
        }
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                Ok(PortAvailability::Available)
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => Ok(PortAvailability::InUse),
            Err(e) => Err(e).with_context(|| format!("cannot probe port {port}")),
        }
    }
}
