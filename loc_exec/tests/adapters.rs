//! Listener and motors adapters talking to real topics over in-process sockets.

use std::{
    f32::consts::FRAC_PI_2,
    thread,
    time::{Duration, Instant},
};

use comms_if::{
    msgs::{Header, LaserScan, Odometry, Pose, PoseWithCovariance, Quaternion, Twist},
    net::{zmq, SocketOptions},
    topic::{TopicPublisher, TopicSubscriber},
};
use loc_lib::{
    listener::{ListenerLaser, ListenerPose3d},
    motors::PublisherMotors,
};

/// Poll `f` until it returns true or five seconds pass.
fn wait_for<F: FnMut() -> bool>(mut f: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
        if f() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn scan(seq: u32) -> LaserScan {
    LaserScan {
        header: Header::now(seq, "base_scan"),
        angle_min: -FRAC_PI_2,
        angle_max: FRAC_PI_2,
        angle_increment: FRAC_PI_2,
        range_min: 0.1,
        range_max: 8.0,
        ranges: vec![1.0, 2.0, 3.0],
        ..Default::default()
    }
}

#[test]
fn test_laser_listener() {
    let ctx = zmq::Context::new();

    let scan_pub: TopicPublisher<LaserScan> = TopicPublisher::new(
        &ctx,
        "inproc://adapters_laser",
        "/scan",
        SocketOptions::publisher(),
    )
    .unwrap();

    let listener = ListenerLaser::new(&ctx, "inproc://adapters_laser", "/scan").unwrap();

    assert!(listener.is_running());
    assert!(listener.get_laser_data().values.is_empty());

    assert!(wait_for(|| {
        scan_pub.publish(&scan(1)).unwrap();
        !listener.get_laser_data().values.is_empty()
    }));

    let laser = listener.get_laser_data();
    assert_eq!(laser.values, vec![1.0, 2.0, 3.0]);
    assert!(laser.min_angle.abs() < 1e-6);
    assert!((laser.max_angle - 2.0 * FRAC_PI_2).abs() < 1e-6);
    assert!(laser.timestamp > 0.0);
}

#[test]
fn test_pose_listener_stop_and_restart() {
    let ctx = zmq::Context::new();

    let odom_pub: TopicPublisher<Odometry> = TopicPublisher::new(
        &ctx,
        "inproc://adapters_pose",
        "/odom",
        SocketOptions::publisher(),
    )
    .unwrap();

    let mut listener = ListenerPose3d::new(&ctx, "inproc://adapters_pose", "/odom").unwrap();

    let odom_at = |x: f64, yaw: f64| Odometry {
        pose: PoseWithCovariance {
            pose: Pose {
                position: comms_if::msgs::Point { x, y: 0.0, z: 0.0 },
                orientation: Quaternion::from_yaw(yaw),
            },
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(wait_for(|| {
        odom_pub.publish(&odom_at(1.0, 0.5)).unwrap();
        listener.get_pose3d().x == 1.0
    }));
    assert!((listener.get_pose3d().yaw - 0.5).abs() < 1e-9);

    listener.stop();
    assert!(!listener.is_running());

    // Nothing gets through while stopped, the last value is kept
    for _ in 0..20 {
        odom_pub.publish(&odom_at(2.0, 0.0)).unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(listener.get_pose3d().x, 1.0);

    listener.start().unwrap();
    assert!(listener.is_running());

    // Starting twice is harmless
    listener.start().unwrap();

    assert!(wait_for(|| {
        odom_pub.publish(&odom_at(3.0, 0.0)).unwrap();
        listener.get_pose3d().x == 3.0
    }));
}

#[test]
fn test_motors_publish() {
    let ctx = zmq::Context::new();

    let motors = PublisherMotors::new(
        &ctx,
        "inproc://adapters_motors",
        "/cmd_vel",
        Some(2.0),
        None,
    )
    .unwrap();

    let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
        &ctx,
        "inproc://adapters_motors",
        "/cmd_vel",
        SocketOptions::subscriber(20),
    )
    .unwrap();

    assert_eq!(motors.get_max_v(), 2.0);
    assert_eq!(motors.get_max_w(), 0.5);

    motors.send_v(1.0);
    motors.send_w(0.3);

    // The background thread republishes, so no explicit publish is needed
    let mut last = None;
    assert!(wait_for(|| {
        if let Some(t) = sub.recv().unwrap() {
            last = Some(t);
        }
        matches!(last, Some(ref t) if t.linear.x == 1.0 && t.angular.z == 0.3)
    }));

    motors.send_vy(0.2);
    motors.publish().unwrap();

    assert!(wait_for(|| {
        matches!(sub.recv().unwrap(), Some(t) if t.linear.y == 0.2)
    }));
}

#[test]
fn test_motors_restart() {
    let ctx = zmq::Context::new();

    let mut motors = PublisherMotors::new(
        &ctx,
        "inproc://adapters_motors_restart",
        "/cmd_vel",
        None,
        None,
    )
    .unwrap();

    motors.stop();
    assert!(!motors.is_running());

    // Closing the old socket releases the endpoint asynchronously
    assert!(wait_for(|| motors.start().is_ok()));
    assert!(motors.is_running());

    let sub: TopicSubscriber<Twist> = TopicSubscriber::new(
        &ctx,
        "inproc://adapters_motors_restart",
        "/cmd_vel",
        SocketOptions::subscriber(20),
    )
    .unwrap();

    motors.send_w(-0.4);

    assert!(wait_for(|| {
        matches!(sub.recv().unwrap(), Some(t) if t.angular.z == -0.4)
    }));
}
