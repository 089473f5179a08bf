use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, Stack};
use embassy_time::Duration;

use crate::constants::SOCKET_TIMEOUT_SECS;
use crate::mqtt::Error;

/// Resolves `hostname` and opens a plain TCP connection to it.
pub async fn connect<'a>(
    stack: Stack<'a>,
    rx_buffer: &'a mut [u8],
    tx_buffer: &'a mut [u8],
    hostname: &str,
    port: u16,
) -> Result<TcpSocket<'a>, Error> {
    let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

    let addr = stack
        .dns_query(hostname, DnsQueryType::A)
        .await
        .map_err(|e| {
            log::error!("DNS query for {} failed: {:?}", hostname, e);
            Error::DnsLookupFailed
        })?
        .first()
        .copied()
        .ok_or(Error::DnsLookupFailed)?;

    log::info!("Connecting TCP socket to {}:{}", hostname, port);
    socket.connect((addr, port)).await.map_err(|e| {
        log::error!("TCP connect failed: {:?}", e);
        Error::SocketConnectionFailed
    })?;
    log::info!("TCP connected");

    Ok(socket)
}
