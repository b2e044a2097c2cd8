use core::ffi::CStr;
use core::marker::PhantomData;

use embassy_net::{
    dns::{DnsQueryType, Error as DNSError},
    tcp::{ConnectError, TcpSocket},
    Stack,
};
use embassy_time::Duration;
use embedded_io_async::{Error as _, ErrorKind, ErrorType, Read, ReadExactError, Write};
use esp_mbedtls::Tls;
#[cfg(feature = "tls")]
use esp_mbedtls::{asynch::Session, Certificates, Mode, TlsError, TlsVersion, X509};

const MAX_RETRIES: usize = 3;
const SOCKET_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    DNSQueryFailed(DNSError),
    DNSLookupFailed,
    #[allow(dead_code)]
    SocketConnectionError(ConnectError),
    CACertificateMissing,
    #[cfg(feature = "tls")]
    #[allow(dead_code)]
    TLSSessionFailed(TlsError),
    #[cfg(feature = "tls")]
    #[allow(dead_code)]
    TLSHandshakeFailed(TlsError),
}

/// Broker connection, plain TCP or a TLS session over it
pub struct Transport<'a, S>
where
    S: Read + Write + 'a,
{
    session: S,
    _marker: PhantomData<&'a ()>,
}

async fn connect_socket<'a>(
    stack: Stack<'static>,
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
        .map_err(Error::DNSQueryFailed)?
        .first()
        .copied()
        .ok_or(Error::DNSLookupFailed)?;

    log::info!("Connecting TCP socket to {}:{}", hostname, port);
    socket
        .connect((addr, port))
        .await
        .map_err(Error::SocketConnectionError)?;
    log::info!("TCP connected");

    Ok(socket)
}

#[cfg(feature = "tls")]
impl<'a> Transport<'a, Session<'a, TcpSocket<'a>>> {
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        stack: Stack<'static>,
        tls: &'a Tls<'static>,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        hostname: &str,
        servername: &'a CStr,
        ca_chain: Option<&'a [u8]>,
        port: u16,
    ) -> Result<Self, Error> {
        let ca_chain = ca_chain.ok_or(Error::CACertificateMissing)?;
        let socket = connect_socket(stack, rx_buffer, tx_buffer, hostname, port).await?;

        let certificates = Certificates {
            ca_chain: Some(X509::pem(ca_chain).map_err(Error::TLSSessionFailed)?),
            ..Default::default()
        };

        let mut session = Session::new(
            socket,
            Mode::Client { servername },
            TlsVersion::Tls1_2,
            certificates,
            tls.reference(),
        )
        .map_err(Error::TLSSessionFailed)?;

        log::info!("Starting TLS handshake with {}", hostname);
        session.connect().await.map_err(|e| {
            log::error!("TLS handshake failed: {:?}", e);
            Error::TLSHandshakeFailed(e)
        })?;
        log::info!("TLS handshake complete");

        Ok(Self {
            session,
            _marker: PhantomData,
        })
    }
}

#[cfg(not(feature = "tls"))]
impl<'a> Transport<'a, TcpSocket<'a>> {
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        stack: Stack<'static>,
        _tls: &'a Tls<'static>,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        hostname: &str,
        _servername: &'a CStr,
        _ca_chain: Option<&'a [u8]>,
        port: u16,
    ) -> Result<Self, Error> {
        let socket = connect_socket(stack, rx_buffer, tx_buffer, hostname, port).await?;

        Ok(Self {
            session: socket,
            _marker: PhantomData,
        })
    }
}

// Peer went away, retrying cannot help
fn is_closed(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
    )
}

impl<'a, S> ErrorType for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
{
    type Error = S::Error;
}

impl<'a, S> Read for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, S::Error> {
        let mut attempt = 0;
        loop {
            match self.session.read(buf).await {
                Ok(n) => return Ok(n),
                Err(e) => {
                    attempt += 1;
                    if is_closed(e.kind()) || attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    log::warn!("read attempt {} failed: {:?}", attempt, e);
                }
            }
        }
    }

    async fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<(), ReadExactError<S::Error>> {
        while !buf.is_empty() {
            match self.read(buf).await {
                Ok(0) => return Err(ReadExactError::UnexpectedEof),
                Ok(n) => buf = &mut buf[n..],
                Err(e) if is_closed(e.kind()) => return Err(ReadExactError::UnexpectedEof),
                Err(e) => return Err(ReadExactError::Other(e)),
            }
        }
        Ok(())
    }
}

impl<'a, S> Write for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, S::Error> {
        let mut attempt = 0;
        loop {
            match self.session.write(buf).await {
                Ok(n) => return Ok(n),
                Err(e) => {
                    attempt += 1;
                    if is_closed(e.kind()) || attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    log::warn!("write attempt {} failed: {:?}", attempt, e);
                }
            }
        }
    }

    async fn flush(&mut self) -> Result<(), S::Error> {
        self.session.flush().await
    }
}
