//! # Topic Listeners
//!
//! A listener subscribes to a single topic and keeps the most recent message, translated into a
//! framework type, behind a mutex. A background thread does the receiving so that readers only
//! ever take a copy of the latest value.
//!
//! There is no queue. If two messages arrive between reads the older one is lost.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    msgs::{LaserScan, Odometry},
    net::{zmq, SocketOptions},
    topic::{TopicError, TopicSubscriber},
};
use log::{error, warn};
use serde::de::DeserializeOwned;

use crate::types::{LaserData, Pose3d};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the background socket. Bounds how long `stop` waits for the thread.
const LISTENER_RECV_TIMEOUT_MS: i32 = 50;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Keeps the latest value received on a topic.
///
/// `M` is the message type on the wire and `D` the framework type it is translated into.
pub struct Listener<M, D> {
    ctx: zmq::Context,
    endpoint: String,
    topic: String,

    latest: Arc<Mutex<D>>,

    bg_run: Arc<AtomicBool>,
    bg_jh: Option<JoinHandle<()>>,

    _msg: PhantomData<fn() -> M>,
}

/// Listener for laser scans.
pub type ListenerLaser = Listener<LaserScan, LaserData>;

/// Listener for the robot's odometry.
pub type ListenerPose3d = Listener<Odometry, Pose3d>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Could not subscribe: {0}")]
    SubscribeError(#[from] TopicError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<M, D> Listener<M, D>
where
    M: DeserializeOwned + 'static,
    D: for<'a> From<&'a M> + Default + Clone + Send + 'static,
{
    /// Create a new listener and start it.
    pub fn new(ctx: &zmq::Context, endpoint: &str, topic: &str) -> Result<Self, ListenerError> {
        let mut listener = Self {
            ctx: ctx.clone(),
            endpoint: endpoint.into(),
            topic: topic.into(),
            latest: Arc::new(Mutex::new(D::default())),
            bg_run: Arc::new(AtomicBool::new(false)),
            bg_jh: None,
            _msg: PhantomData,
        };

        listener.start()?;

        Ok(listener)
    }

    /// Subscribe to the topic and start receiving in the background.
    ///
    /// Does nothing if the listener is already running. The last received value is kept across a
    /// stop and start.
    pub fn start(&mut self) -> Result<(), ListenerError> {
        if self.is_running() {
            return Ok(());
        }

        // Reap a thread which ended on its own
        self.stop();

        let subscriber = TopicSubscriber::<M>::new(
            &self.ctx,
            &self.endpoint,
            &self.topic,
            SocketOptions::subscriber(LISTENER_RECV_TIMEOUT_MS),
        )?;

        self.bg_run.store(true, Ordering::Relaxed);

        let bg_run_clone = self.bg_run.clone();
        let latest_clone = self.latest.clone();

        self.bg_jh = Some(thread::spawn(move || {
            bg_thread(subscriber, bg_run_clone, latest_clone)
        }));

        Ok(())
    }

    /// Stop receiving and drop the subscription.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("Listener for {} panicked", self.topic);
            }
        }
    }

    /// Return whether the listener is currently receiving.
    pub fn is_running(&self) -> bool {
        self.bg_jh.is_some() && self.bg_run.load(Ordering::Relaxed)
    }

    /// Return a copy of the latest value, or the default if nothing has been received yet.
    pub fn get(&self) -> D {
        self.latest
            .lock()
            .expect("Listener: latest mutex poisoned")
            .clone()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<M, D> Drop for Listener<M, D> {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

impl ListenerLaser {
    /// Return the latest laser scan.
    pub fn get_laser_data(&self) -> LaserData {
        self.get()
    }
}

impl ListenerPose3d {
    /// Return the latest pose.
    pub fn get_pose3d(&self) -> Pose3d {
        self.get()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, replaces the latest value whenever a new message arrives.
fn bg_thread<M, D>(subscriber: TopicSubscriber<M>, run: Arc<AtomicBool>, latest: Arc<Mutex<D>>)
where
    M: DeserializeOwned,
    D: for<'a> From<&'a M>,
{
    while run.load(Ordering::Relaxed) {
        let msg = match subscriber.recv() {
            Ok(Some(m)) => m,
            Ok(None) => continue,
            Err(e @ TopicError::DeserializeError(_, _)) => {
                warn!("{}", e);
                continue;
            }
            Err(e) => {
                error!("Listener for {} stopped: {}", subscriber.topic(), e);
                run.store(false, Ordering::Relaxed);
                break;
            }
        };

        let data = D::from(&msg);

        {
            let mut l = latest.lock().expect("Listener: latest mutex poisoned");
            *l = data;
        }
    }
}
