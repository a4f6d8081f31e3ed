//! # Message Conversions
//!
//! Translations between the middleware messages (see [`comms_if::msgs`]) and the framework's data
//! types.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f32::consts::FRAC_PI_2;

use comms_if::msgs::{LaserScan, Odometry, Twist, Vector3};
use util::maths::{quat_to_pitch, quat_to_roll, quat_to_yaw};

use crate::types::{CmdVel, LaserData, Pose3d};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Translate a middleware laser scan into [`LaserData`].
///
/// The middleware measures angles from straight ahead while the framework measures them from the
/// robot's right, so both angle limits are rotated by pi/2.
pub fn laser_scan_to_laser_data(scan: &LaserScan) -> LaserData {
    LaserData {
        values: scan.ranges.clone(),
        min_angle: scan.angle_min + FRAC_PI_2,
        max_angle: scan.angle_max + FRAC_PI_2,
        min_range: scan.range_min,
        max_range: scan.range_max,
        timestamp: scan.header.stamp.to_secs_f64(),
    }
}

/// Translate a [`CmdVel`] into a middleware twist.
pub fn cmd_vel_to_twist(vel: &CmdVel) -> Twist {
    Twist {
        linear: Vector3 {
            x: vel.vx,
            y: vel.vy,
            z: vel.vz,
        },
        angular: Vector3 {
            x: vel.ax,
            y: vel.ay,
            z: vel.az,
        },
    }
}

/// Translate middleware odometry into a [`Pose3d`].
pub fn odometry_to_pose3d(odom: &Odometry) -> Pose3d {
    let pos = &odom.pose.pose.position;
    let ori = &odom.pose.pose.orientation;

    Pose3d {
        x: pos.x,
        y: pos.y,
        z: pos.z,
        h: 1.0,
        yaw: quat_to_yaw(ori.w, ori.x, ori.y, ori.z),
        pitch: quat_to_pitch(ori.w, ori.x, ori.y, ori.z),
        roll: quat_to_roll(ori.w, ori.x, ori.y, ori.z),
        q: [ori.w, ori.x, ori.y, ori.z],
        timestamp: odom.header.stamp.to_secs_f64(),
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<&LaserScan> for LaserData {
    fn from(scan: &LaserScan) -> Self {
        laser_scan_to_laser_data(scan)
    }
}

impl From<&Odometry> for Pose3d {
    fn from(odom: &Odometry) -> Self {
        odometry_to_pose3d(odom)
    }
}

impl From<&CmdVel> for Twist {
    fn from(vel: &CmdVel) -> Self {
        cmd_vel_to_twist(vel)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msgs::{Header, Point, Pose, PoseWithCovariance, Quaternion, Time};
    use std::f64::consts::PI;

    fn stamp() -> Header {
        Header {
            seq: 7,
            stamp: Time {
                secs: 100,
                nsecs: 250_000_000,
            },
            frame_id: "base_scan".into(),
        }
    }

    #[test]
    fn test_laser_scan() {
        let scan = LaserScan {
            header: stamp(),
            angle_min: -FRAC_PI_2,
            angle_max: FRAC_PI_2,
            angle_increment: FRAC_PI_2,
            range_min: 0.12,
            range_max: 3.5,
            ranges: vec![1.0, 2.0, 3.0],
            ..Default::default()
        };

        let laser = LaserData::from(&scan);

        assert_eq!(laser.values, vec![1.0, 2.0, 3.0]);
        assert!(laser.min_angle.abs() < 1e-6);
        assert!((laser.max_angle - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(laser.min_range, 0.12);
        assert_eq!(laser.max_range, 3.5);
        assert!((laser.timestamp - 100.25).abs() < 1e-9);
    }

    #[test]
    fn test_cmd_vel() {
        let vel = CmdVel {
            vx: 1.0,
            vy: 2.0,
            vz: 3.0,
            ax: 4.0,
            ay: 5.0,
            az: 6.0,
            timestamp: 0.0,
        };

        let twist = Twist::from(&vel);

        assert_eq!(
            (twist.linear.x, twist.linear.y, twist.linear.z),
            (1.0, 2.0, 3.0)
        );
        assert_eq!(
            (twist.angular.x, twist.angular.y, twist.angular.z),
            (4.0, 5.0, 6.0)
        );
    }

    #[test]
    fn test_odometry() {
        let yaw = 0.75;
        let odom = Odometry {
            header: stamp(),
            pose: PoseWithCovariance {
                pose: Pose {
                    position: Point {
                        x: 1.5,
                        y: -2.0,
                        z: 0.1,
                    },
                    orientation: Quaternion::from_yaw(yaw),
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let pose = Pose3d::from(&odom);

        assert_eq!((pose.x, pose.y, pose.z, pose.h), (1.5, -2.0, 0.1, 1.0));
        assert!((pose.yaw - yaw).abs() < 1e-9);
        assert!(pose.pitch.abs() < 1e-9);
        assert!(pose.roll.abs() < 1e-9);
        assert_eq!(pose.q[0], (yaw / 2.0).cos());
        assert_eq!(pose.q[3], (yaw / 2.0).sin());
        assert!((pose.timestamp - 100.25).abs() < 1e-9);
    }

    #[test]
    fn test_odometry_facing_backwards() {
        let odom = Odometry {
            pose: PoseWithCovariance {
                pose: Pose {
                    orientation: Quaternion::from_yaw(PI),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };

        assert!((Pose3d::from(&odom).yaw.abs() - PI).abs() < 1e-9);
    }
}
