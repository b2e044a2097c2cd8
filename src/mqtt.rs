//! MQTT 3.1.1 session for ThingSpeak's broker.
//!
//! ThingSpeak only speaks MQTT 3.1.1 and only accepts QoS 0 publishes. A
//! [`MqttSession`] connects with the device credentials, publishes at QoS 0
//! and disconnects. Packets are encoded with `mqttrs` over any
//! `embedded-io-async` stream.

use embedded_io_async::{Read, Write};
use mqttrs::{decode_slice, encode_slice, Connack, ConnectReturnCode, Packet, Protocol, QosPid};

use crate::publish::Publish;

#[derive(Debug)]
pub enum MqttError<E> {
    Transport(E),
    Encode(mqttrs::Error),
    Decode(mqttrs::Error),
    /// Broker answered CONNECT with a non-zero return code
    Refused(ConnectReturnCode),
    /// Broker sent something other than a CONNACK
    UnexpectedPacket,
    /// Connection closed before the CONNACK arrived
    Closed,
    /// CONNACK did not fit in the receive buffer
    BufferFull,
}

/// ThingSpeak MQTT device credentials.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub keep_alive_secs: u16,
}

pub struct MqttSession<'b, T> {
    transport: T,
    tx_buffer: &'b mut [u8],
    rx_buffer: &'b mut [u8],
}

impl<'b, T> MqttSession<'b, T>
where
    T: Read + Write,
{
    /// Sends CONNECT on a clean session and waits for the broker to accept it.
    pub async fn connect(
        transport: T,
        tx_buffer: &'b mut [u8],
        rx_buffer: &'b mut [u8],
        options: &ConnectOptions<'_>,
    ) -> Result<Self, MqttError<T::Error>> {
        let mut session = Self {
            transport,
            tx_buffer,
            rx_buffer,
        };

        session
            .send(&Packet::Connect(mqttrs::Connect {
                protocol: Protocol::MQTT311,
                keep_alive: options.keep_alive_secs,
                client_id: options.client_id,
                clean_session: true,
                last_will: None,
                username: Some(options.username),
                password: Some(options.password.as_bytes()),
            }))
            .await?;

        let connack = session.connack().await?;
        if !matches!(connack.code, ConnectReturnCode::Accepted) {
            log::error!("Broker refused connection: {:?}", connack.code);
            return Err(MqttError::Refused(connack.code));
        }

        log::info!("MQTT connected as {}", options.client_id);
        Ok(session)
    }

    pub async fn disconnect(mut self) -> Result<(), MqttError<T::Error>> {
        self.send(&Packet::Disconnect).await
    }

    async fn send(&mut self, packet: &Packet<'_>) -> Result<(), MqttError<T::Error>> {
        let len = encode_slice(packet, self.tx_buffer)
            .map_err(MqttError::Encode)?;
        self.transport
            .write_all(&self.tx_buffer[..len])
            .await
            .map_err(MqttError::Transport)?;
        self.transport.flush().await.map_err(MqttError::Transport)
    }

    async fn connack(&mut self) -> Result<Connack, MqttError<T::Error>> {
        let mut len = 0;
        loop {
            if len == self.rx_buffer.len() {
                return Err(MqttError::BufferFull);
            }

            let n = self
                .transport
                .read(&mut self.rx_buffer[len..])
                .await
                .map_err(MqttError::Transport)?;
            if n == 0 {
                return Err(MqttError::Closed);
            }
            len += n;

            let packet = decode_slice(&self.rx_buffer[..len]).map_err(MqttError::Decode)?;
            match packet {
                Some(Packet::Connack(connack)) => return Ok(connack),
                Some(packet) => {
                    log::error!("Expected CONNACK, got {:?}", packet);
                    return Err(MqttError::UnexpectedPacket);
                }
                None => continue,
            }
        }
    }
}

impl<'b, T> Publish for MqttSession<'b, T>
where
    T: Read + Write,
{
    type Error = MqttError<T::Error>;

    /// QoS 0, not retained. No acknowledgement is expected.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        self.send(&Packet::Publish(mqttrs::Publish {
            dup: false,
            qospid: QosPid::AtMostOnce,
            retain: false,
            topic_name: topic,
            payload,
        }))
        .await
    }
}

#[cfg(test)]
mod test {
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_io_async::ErrorType;
    use std::vec::Vec;

    use super::*;
    use crate::{Feed, FeedPublisher, Payload};

    const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
    const CONNACK_NOT_AUTHORIZED: [u8; 4] = [0x20, 0x02, 0x00, 0x05];
    const PINGRESP: [u8; 2] = [0xd0, 0x00];
    const DISCONNECT: [u8; 2] = [0xe0, 0x00];

    const OPTIONS: ConnectOptions = ConnectOptions {
        client_id: "pond-client",
        username: "pond-user",
        password: "secret",
        keep_alive_secs: 30,
    };

    /// Replays broker bytes one at a time and records every write.
    #[derive(Default)]
    struct Broker {
        inbound: Vec<u8>,
        read: usize,
        sent: Vec<Vec<u8>>,
    }

    impl Broker {
        fn replying(inbound: &[u8]) -> Self {
            Self {
                inbound: inbound.to_vec(),
                ..Default::default()
            }
        }
    }

    impl ErrorType for Broker {
        type Error = Infallible;
    }

    impl Read for Broker {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.inbound.get(self.read) {
                Some(byte) if !buf.is_empty() => {
                    buf[0] = *byte;
                    self.read += 1;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    impl Write for Broker {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.sent.push(buf.to_vec());
            Ok(buf.len())
        }
    }

    type Connected<'a> = Result<MqttSession<'static, &'a mut Broker>, MqttError<Infallible>>;

    fn connect(broker: &mut Broker) -> Connected<'_> {
        let tx = vec![0u8; 512].leak();
        let rx = vec![0u8; 64].leak();
        block_on(MqttSession::connect(broker, tx, rx, &OPTIONS))
    }

    #[test]
    fn connect_as_mqtt_311_with_credentials() {
        let mut broker = Broker::replying(&CONNACK_ACCEPTED);
        connect(&mut broker).unwrap();

        assert_eq!(broker.sent.len(), 1);
        let Ok(Some(Packet::Connect(packet))) = decode_slice(&broker.sent[0]) else {
            panic!("not a CONNECT: {:02x?}", broker.sent[0]);
        };
        assert!(matches!(packet.protocol, Protocol::MQTT311));
        assert_eq!(packet.client_id, "pond-client");
        assert_eq!(packet.username, Some("pond-user"));
        assert_eq!(packet.password, Some(&b"secret"[..]));
        assert_eq!(packet.keep_alive, 30);
        assert!(packet.clean_session);
        assert!(packet.last_will.is_none());
    }

    #[test]
    fn connect_refused() {
        let mut broker = Broker::replying(&CONNACK_NOT_AUTHORIZED);
        let result = connect(&mut broker);
        assert!(matches!(
            result,
            Err(MqttError::Refused(ConnectReturnCode::NotAuthorized))
        ));
    }

    #[test]
    fn connection_closed_before_connack() {
        let mut broker = Broker::replying(&CONNACK_ACCEPTED[..3]);
        assert!(matches!(connect(&mut broker), Err(MqttError::Closed)));
    }

    #[test]
    fn unexpected_packet_instead_of_connack() {
        let mut broker = Broker::replying(&PINGRESP);
        assert!(matches!(connect(&mut broker), Err(MqttError::UnexpectedPacket)));
    }

    #[test]
    fn connack_larger_than_buffer() {
        let mut broker = Broker::replying(&CONNACK_ACCEPTED);
        let tx = vec![0u8; 512].leak();
        let rx = vec![0u8; 2].leak();
        let result = block_on(MqttSession::connect(&mut broker, tx, rx, &OPTIONS));
        assert!(matches!(result, Err(MqttError::BufferFull)));
    }

    #[test]
    fn feed_update_is_published_at_qos_0() {
        let mut broker = Broker::replying(&CONNACK_ACCEPTED);
        let mut session = connect(&mut broker).unwrap();

        let feed = Feed::new("Pond_Sensor", "12345").unwrap();
        let mut payload = Payload::new().with_status("MQTTPUBLISH");
        payload.set_field(1, 12.5).unwrap();

        block_on(FeedPublisher::new(&mut session, &feed).publish_payload(&payload)).unwrap();
        block_on(session.disconnect()).unwrap();

        assert_eq!(broker.sent.len(), 3);
        let Ok(Some(Packet::Publish(publish))) = decode_slice(&broker.sent[1]) else {
            panic!("not a PUBLISH: {:02x?}", broker.sent[1]);
        };
        assert_eq!(publish.topic_name, "channels/12345/publish");
        assert_eq!(publish.payload, b"field1=12.50&status=MQTTPUBLISH");
        assert!(matches!(publish.qospid, QosPid::AtMostOnce));
        assert!(!publish.retain);
        assert!(!publish.dup);

        assert_eq!(broker.sent[2], DISCONNECT);
    }
}
