use zenoh::Session;
use edgefirst_schemas::std_msgs::Header;
use edgefirst_schemas::builtin_interfaces::Time;
use serde::{Deserialize, Serialize};
use kinematics::JointState as KinematicsJointState;
use log::{debug, warn};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::registry::JointTarget;

/// ROS 2 CDR encapsulation header (Little Endian).
const CDR_LE_HEADER: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JointState {
    pub header: Header,
    pub name: Vec<String>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

impl Default for JointState {
    fn default() -> Self {
        Self {
            header: Header {
                stamp: Time::new(0, 0),
                frame_id: String::new(),
            },
            name: Vec::new(),
            position: Vec::new(),
            velocity: Vec::new(),
            effort: Vec::new(),
        }
    }
}

pub fn encode_joint_state(msg: &JointState) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut payload = CDR_LE_HEADER.to_vec();
    let data = cdr::ser::serialize_data::<_, _, cdr::LittleEndian>(msg, cdr::Infinite)?;
    payload.extend(data);
    Ok(payload)
}

pub fn decode_joint_state(payload: &[u8]) -> Option<JointState> {
    if payload.len() <= CDR_LE_HEADER.len() {
        warn!("Received payload too short for ROS 2 message");
        return None;
    }
    let mut deserializer = cdr::Deserializer::<_, _, cdr::LittleEndian>::new(&payload[CDR_LE_HEADER.len()..], cdr::Infinite);
    match serde::Deserialize::deserialize(&mut deserializer) {
        Ok(msg) => Some(msg),
        Err(_) => {
            warn!("Failed to deserialize JointState");
            None
        }
    }
}

/// Zenoh link to the robot's control boards, one key pair per part.
pub struct CommunicationLayer {
    session: Session,
    robot: String,
}

impl CommunicationLayer {
    pub async fn new(robot: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = zenoh::config::Config::default();
        let session = zenoh::open(config).await.map_err(|e| e.to_string())?;

        Ok(Self {
            session,
            robot: robot.to_string(),
        })
    }

    pub fn joint_command_key(&self, part: &str) -> String {
        format!("rt/{}/{}/joint_commands", self.robot, part)
    }

    pub fn joint_state_key(&self, part: &str) -> String {
        format!("rt/{}/{}/joint_states", self.robot, part)
    }

    pub async fn publish_joint_targets(&self, part: &str, targets: &[JointTarget]) -> Result<(), Box<dyn std::error::Error>> {
        let msg = Self::convert_to_ros_joint_state(targets);
        let payload = encode_joint_state(&msg)?;
        let key = self.joint_command_key(part);
        self.session.put(&key, payload).await.map_err(|e| e.to_string())?;
        debug!("published {} targets on {key}", targets.len());
        Ok(())
    }

    pub async fn subscribe_joint_state<F>(&self, part: &str, callback: F) -> Result<(), Box<dyn std::error::Error>>
    where F: Fn(Vec<(String, KinematicsJointState)>) + Send + Sync + 'static
    {
        let subscriber = self.session.declare_subscriber(self.joint_state_key(part)).await.map_err(|e| e.to_string())?;

        tokio::spawn(async move {
            while let Ok(sample) = subscriber.recv_async().await {
                let payload = sample.payload().to_bytes();
                if let Some(msg) = decode_joint_state(&payload) {
                    callback(Self::convert_from_ros_joint_state(&msg));
                }
            }
        });
        Ok(())
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error>> {
        self.session.close().await.map_err(|e| e.to_string())?;
        Ok(())
    }

    fn convert_to_ros_joint_state(targets: &[JointTarget]) -> JointState {
        let mut msg = JointState::default();

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        msg.header.stamp = Time::new(now.as_secs() as i32, now.subsec_nanos());
        msg.header.frame_id = "root_link".to_string();

        for target in targets {
            msg.name.push(target.name.clone());
            msg.position.push(target.position);
            msg.velocity.push(0.0);
            msg.effort.push(0.0);
        }
        msg
    }

    fn convert_from_ros_joint_state(msg: &JointState) -> Vec<(String, KinematicsJointState)> {
        let mut joints = Vec::new();
        for (i, name) in msg.name.iter().enumerate() {
            let Some(&angle) = msg.position.get(i) else {
                break;
            };
            joints.push((
                name.clone(),
                KinematicsJointState {
                    angle,
                    velocity: msg.velocity.get(i).copied().unwrap_or(0.0),
                    effort: msg.effort.get(i).copied().unwrap_or(0.0),
                },
            ));
        }
        joints
    }
}
