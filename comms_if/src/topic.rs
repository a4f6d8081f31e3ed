//! # Topic Module
//!
//! Named, typed publish/subscribe channels built on [`MonitoredSocket`].
//!
//! Every message on a topic is sent as a two part zmq message:
//!
//! 1. The topic name, e.g. `"/scan"`, which subscribers filter on.
//! 2. The message itself serialised as JSON.
//!
//! zmq subscription filters match on prefix, so a subscriber to `/scan` would also see `/scan2`.
//! [`TopicSubscriber::recv`] checks the full topic name and drops anything which isn't an exact
//! match.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::marker::PhantomData;

use log::trace;
use serde::{de::DeserializeOwned, Serialize};

use crate::net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Publishes messages of type `M` on a single topic.
pub struct TopicPublisher<M> {
    socket: MonitoredSocket,
    topic: String,
    _msg: PhantomData<fn(M)>,
}

/// Receives messages of type `M` from a single topic.
pub struct TopicSubscriber<M> {
    socket: MonitoredSocket,
    topic: String,
    _msg: PhantomData<fn() -> M>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to topic {0}: {1}")]
    SubscribeError(String, zmq::Error),

    #[error("Could not send message on topic {0}: {1}")]
    SendError(String, zmq::Error),

    #[error("Could not receive a message on topic {0}: {1}")]
    RecvError(String, zmq::Error),

    #[error("Could not serialize the message for topic {0}: {1}")]
    SerializationError(String, serde_json::Error),

    #[error("Could not deserialize the message from topic {0}: {1}")]
    DeserializeError(String, serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<M> TopicPublisher<M>
where
    M: Serialize,
{
    /// Create a new publisher for `topic` on the given endpoint.
    ///
    /// Use [`SocketOptions::publisher`] for the usual bound publisher.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        topic: &str,
        socket_options: SocketOptions,
    ) -> Result<Self, TopicError> {
        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, endpoint)
            .map_err(TopicError::SocketError)?;

        Ok(Self {
            socket,
            topic: topic.into(),
            _msg: PhantomData,
        })
    }

    /// The name of the topic this publisher sends on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Return whether at least one subscriber is connected.
    pub fn connected(&self) -> bool {
        self.socket.connected()
    }

    /// Publish a message.
    ///
    /// Messages published while no subscriber is connected are dropped by zmq.
    pub fn publish(&self, msg: &M) -> Result<(), TopicError> {
        let payload = serde_json::to_string(msg)
            .map_err(|e| TopicError::SerializationError(self.topic.clone(), e))?;

        self.socket
            .send_multipart(vec![self.topic.as_bytes(), payload.as_bytes()], 0)
            .map_err(|e| TopicError::SendError(self.topic.clone(), e))
    }
}

impl<M> TopicSubscriber<M>
where
    M: DeserializeOwned,
{
    /// Create a new subscriber to `topic` on the given endpoint.
    ///
    /// Use [`SocketOptions::subscriber`] for the usual non-blocking subscriber, the receive timeout
    /// set there bounds how long [`TopicSubscriber::recv`] blocks.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        topic: &str,
        socket_options: SocketOptions,
    ) -> Result<Self, TopicError> {
        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)
            .map_err(TopicError::SocketError)?;

        socket
            .set_subscribe(topic.as_bytes())
            .map_err(|e| TopicError::SubscribeError(topic.into(), e))?;

        Ok(Self {
            socket,
            topic: topic.into(),
            _msg: PhantomData,
        })
    }

    /// The name of the topic this subscriber receives from.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Return whether the subscriber is connected to a publisher.
    pub fn connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive a single message from the topic.
    ///
    /// Returns `Ok(None)` if nothing arrived within the receive timeout, or if the message which
    /// did arrive had the wrong number of parts or belonged to a different topic sharing the same
    /// prefix. A payload which isn't a valid `M` is an error.
    pub fn recv(&self) -> Result<Option<M>, TopicError> {
        let parts = match self.socket.recv_multipart(0) {
            Ok(p) => p,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(TopicError::RecvError(self.topic.clone(), e)),
        };

        if parts.len() != 2 {
            trace!(
                "Dropping message with {} parts on topic {}",
                parts.len(),
                self.topic
            );
            return Ok(None);
        }

        if parts[0] != self.topic.as_bytes() {
            return Ok(None);
        }

        serde_json::from_slice(&parts[1])
            .map(Some)
            .map_err(|e| TopicError::DeserializeError(self.topic.clone(), e))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::msgs::{Twist, Vector3};
    use std::time::{Duration, Instant};

    /// Publish defaults until the subscriber gets something, covering the zmq slow joiner.
    fn exchange<M>(pubr: &TopicPublisher<M>, sub: &TopicSubscriber<M>) -> Option<M>
    where
        M: Serialize + DeserializeOwned,
        M: Default,
    {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            pubr.publish(&M::default()).unwrap();
            if let Some(m) = sub.recv().unwrap() {
                return Some(m);
            }
        }
        None
    }

    #[test]
    fn test_pub_sub_round_trip() {
        let ctx = zmq::Context::new();

        let pubr: TopicPublisher<Twist> = TopicPublisher::new(
            &ctx,
            "inproc://topic_test_rt",
            "/cmd_vel",
            SocketOptions::publisher(),
        )
        .unwrap();
        let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
            &ctx,
            "inproc://topic_test_rt",
            "/cmd_vel",
            SocketOptions::subscriber(20),
        )
        .unwrap();

        assert_eq!(sub.topic(), "/cmd_vel");
        assert_eq!(exchange(&pubr, &sub), Some(Twist::default()));

        let twist = Twist {
            linear: Vector3 {
                x: 1.5,
                y: 0.0,
                z: 0.0,
            },
            angular: Vector3 {
                x: 0.0,
                y: 0.0,
                z: -0.25,
            },
        };
        pubr.publish(&twist).unwrap();

        // Drain any defaults still in flight from the handshake loop
        let start = Instant::now();
        let mut got = None;
        while start.elapsed() < Duration::from_secs(5) {
            match sub.recv().unwrap() {
                Some(t) if t == twist => {
                    got = Some(t);
                    break;
                }
                _ => continue,
            }
        }
        assert_eq!(got, Some(twist));
    }

    #[test]
    fn test_prefix_topic_is_ignored() {
        let ctx = zmq::Context::new();

        let long: TopicPublisher<Twist> = TopicPublisher::new(
            &ctx,
            "inproc://topic_test_prefix",
            "/cmd_vel_raw",
            SocketOptions::publisher(),
        )
        .unwrap();
        let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
            &ctx,
            "inproc://topic_test_prefix",
            "/cmd_vel",
            SocketOptions::subscriber(20),
        )
        .unwrap();

        // Give the subscription time to propagate, then make sure nothing gets through
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(300) {
            long.publish(&Twist::default()).unwrap();
            assert!(sub.recv().unwrap().is_none());
        }
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let ctx = zmq::Context::new();

        let raw = ctx.socket(zmq::PUB).unwrap();
        raw.bind("inproc://topic_test_malformed").unwrap();

        let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
            &ctx,
            "inproc://topic_test_malformed",
            "/cmd_vel",
            SocketOptions::subscriber(20),
        )
        .unwrap();

        let start = Instant::now();
        let mut result = Ok(None);
        while start.elapsed() < Duration::from_secs(5) {
            raw.send_multipart(vec!["/cmd_vel".as_bytes(), &b"not json"[..]], 0)
                .unwrap();
            result = sub.recv();
            if !matches!(result, Ok(None)) {
                break;
            }
        }

        assert!(matches!(result, Err(TopicError::DeserializeError(_, _))));
    }

    #[test]
    fn test_wrong_part_count_is_dropped() {
        let ctx = zmq::Context::new();

        let raw = ctx.socket(zmq::PUB).unwrap();
        raw.bind("inproc://topic_test_parts").unwrap();

        let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
            &ctx,
            "inproc://topic_test_parts",
            "/cmd_vel",
            SocketOptions::subscriber(20),
        )
        .unwrap();

        let payload = serde_json::to_string(&Twist::default()).unwrap();

        // Wait for the subscription to reach the publisher using a well formed message
        let start = Instant::now();
        let mut joined = false;
        while start.elapsed() < Duration::from_secs(5) {
            raw.send_multipart(vec!["/cmd_vel".as_bytes(), payload.as_bytes()], 0)
                .unwrap();
            if sub.recv().unwrap().is_some() {
                joined = true;
                break;
            }
        }
        assert!(joined);

        // Drain anything still queued from the handshake
        while sub.recv().unwrap().is_some() {}

        raw.send("/cmd_vel", 0).unwrap();
        assert!(sub.recv().unwrap().is_none());

        raw.send_multipart(
            vec!["/cmd_vel".as_bytes(), payload.as_bytes(), &b"extra"[..]],
            0,
        )
        .unwrap();
        assert!(sub.recv().unwrap().is_none());

        // Both bad messages were consumed, the next good one comes straight through
        raw.send_multipart(vec!["/cmd_vel".as_bytes(), payload.as_bytes()], 0)
            .unwrap();
        assert_eq!(sub.recv().unwrap(), Some(Twist::default()));
    }
}
