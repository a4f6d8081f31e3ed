//! Minimal robot simulation for exercising the localisation executable without a simulator.
//!
//! The robot is a unicycle inside an empty square room. It publishes a laser scan and odometry on
//! every tick and drives according to the last velocity command it received.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use comms_if::{
    msgs::{Header, LaserScan, Odometry, Point, Pose, PoseWithCovariance, Quaternion, Twist},
    net::SocketOptions,
    topic::{TopicPublisher, TopicSubscriber},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "sim_robot", about = "Publishes simulated scan and odometry topics")]
struct Opts {
    /// Endpoint the scan and odometry publishers bind to
    #[structopt(long, default_value = "tcp://*:5101")]
    sensor_endpoint: String,

    /// Endpoint of the motors publisher to take velocity commands from
    #[structopt(long, default_value = "tcp://localhost:5100")]
    cmd_endpoint: String,

    #[structopt(long, default_value = "/scan")]
    scan_topic: String,

    #[structopt(long, default_value = "/odom")]
    odom_topic: String,

    #[structopt(long, default_value = "/cmd_vel")]
    cmd_topic: String,

    /// Half the side length of the square room, in meters
    #[structopt(long, default_value = "5.0")]
    room_half_size: f64,

    /// Simulation rate
    #[structopt(long, default_value = "10")]
    rate_hz: f64,
}

/// Number of rays in a scan, one per degree over a half circle.
const NUM_RAYS: usize = 180;

const RANGE_MIN_M: f32 = 0.1;
const RANGE_MAX_M: f32 = 8.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();

    let ctx = zmq::Context::new();

    let scan_pub: TopicPublisher<LaserScan> = TopicPublisher::new(
        &ctx,
        &opts.sensor_endpoint,
        &opts.scan_topic,
        SocketOptions::publisher(),
    )?;

    // Both topics share the endpoint, a second bind would fail, so odometry goes out on a
    // second socket bound one port up.
    let odom_endpoint = next_port(&opts.sensor_endpoint).ok_or("Sensor endpoint has no port")?;
    let odom_pub: TopicPublisher<Odometry> = TopicPublisher::new(
        &ctx,
        &odom_endpoint,
        &opts.odom_topic,
        SocketOptions::publisher(),
    )?;

    let cmd_sub: TopicSubscriber<Twist> = TopicSubscriber::new(
        &ctx,
        &opts.cmd_endpoint,
        &opts.cmd_topic,
        SocketOptions::subscriber(0),
    )?;

    println!(
        "Publishing {} on {}, {} on {}, listening for {} on {}",
        opts.scan_topic,
        opts.sensor_endpoint,
        opts.odom_topic,
        odom_endpoint,
        opts.cmd_topic,
        opts.cmd_endpoint
    );

    let period = Duration::from_secs_f64(1.0 / opts.rate_hz);
    let dt = period.as_secs_f64();

    let (mut x, mut y, mut yaw) = (0.0f64, 0.0f64, 0.0f64);
    let mut cmd = Twist::default();
    let mut seq = 0u32;

    loop {
        let tick = Instant::now();

        // Take the newest command, recv_timeout of zero means this never blocks
        while let Some(c) = cmd_sub.recv()? {
            cmd = c;
        }

        // Integrate the unicycle model
        x += cmd.linear.x * yaw.cos() * dt;
        y += cmd.linear.x * yaw.sin() * dt;
        yaw = (yaw + cmd.angular.z * dt + PI).rem_euclid(2.0 * PI) - PI;

        // Keep the robot inside the room
        let limit = opts.room_half_size - 0.2;
        x = x.max(-limit).min(limit);
        y = y.max(-limit).min(limit);

        let header = Header::now(seq, "odom");

        let odom = Odometry {
            header: header.clone(),
            child_frame_id: "base_link".into(),
            pose: PoseWithCovariance {
                pose: Pose {
                    position: Point { x, y, z: 0.0 },
                    orientation: Quaternion::from_yaw(yaw),
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let angle_min = -PI / 2.0;
        let angle_increment = PI / NUM_RAYS as f64;
        let ranges = (0..NUM_RAYS)
            .map(|i| {
                let ray = yaw + angle_min + i as f64 * angle_increment;
                (ray_to_wall(x, y, ray, opts.room_half_size) as f32)
                    .max(RANGE_MIN_M)
                    .min(RANGE_MAX_M)
            })
            .collect();

        let scan = LaserScan {
            header: Header {
                frame_id: "base_scan".into(),
                ..header
            },
            angle_min: angle_min as f32,
            angle_max: (angle_min + (NUM_RAYS - 1) as f64 * angle_increment) as f32,
            angle_increment: angle_increment as f32,
            time_increment: 0.0,
            scan_time: dt as f32,
            range_min: RANGE_MIN_M,
            range_max: RANGE_MAX_M,
            ranges,
            intensities: Vec::new(),
        };

        if let Err(e) = scan_pub.publish(&scan) {
            println!("Failed to publish scan: {}", e);
        }
        if let Err(e) = odom_pub.publish(&odom) {
            println!("Failed to publish odometry: {}", e);
        }

        seq = seq.wrapping_add(1);

        if let Some(d) = period.checked_sub(tick.elapsed()) {
            std::thread::sleep(d);
        }
    }
}

/// Distance from `(x, y)` along the world frame `angle` to the walls of a square room centred on
/// the origin.
fn ray_to_wall(x: f64, y: f64, angle: f64, half_size: f64) -> f64 {
    let (dx, dy) = (angle.cos(), angle.sin());

    let tx = if dx > 1e-9 {
        (half_size - x) / dx
    } else if dx < -1e-9 {
        (-half_size - x) / dx
    } else {
        f64::INFINITY
    };
    let ty = if dy > 1e-9 {
        (half_size - y) / dy
    } else if dy < -1e-9 {
        (-half_size - y) / dy
    } else {
        f64::INFINITY
    };

    tx.min(ty)
}

/// Return the endpoint with its port incremented by one.
fn next_port(endpoint: &str) -> Option<String> {
    let idx = endpoint.rfind(':')?;
    let port: u16 = endpoint[idx + 1..].parse().ok()?;
    Some(format!("{}:{}", &endpoint[..idx], port + 1))
}
