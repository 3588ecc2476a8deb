//! Executor protocol records: descriptors, identifiers and task status.

use serde::{Deserialize, Serialize};

use super::ProtocolMessage;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! protocol_id {
    ($(#[$doc:meta])* $name:ident => $type_name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub value: String,
        }

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self { value: value.into() }
            }
        }

        impl ProtocolMessage for $name {
            const TYPE_NAME: &'static str = $type_name;
        }
    };
}

protocol_id!(
    /// Identifies a framework registered with the controlling agent.
    FrameworkId => "FrameworkID"
);
protocol_id!(
    /// Identifies an executor within a framework.
    ExecutorId => "ExecutorID"
);
protocol_id!(
    /// Identifies the slave (agent host) the executor runs on.
    SlaveId => "SlaveID"
);
protocol_id!(
    /// Identifies a task.
    TaskId => "TaskID"
);

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A named resource allocation, e.g. `cpus: 0.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProtocolMessage for Resource {
    const TYPE_NAME: &'static str = "Resource";
}

/// Command to run for an executor or a command task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default = "default_shell")]
    pub shell: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
}

fn default_shell() -> bool {
    true
}

impl ProtocolMessage for CommandInfo {
    const TYPE_NAME: &'static str = "CommandInfo";
}

/// Describes the executor the driver is running on behalf of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorInfo {
    pub executor_id: ExecutorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<FrameworkId>,
    #[serde(default)]
    pub command: CommandInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Opaque framework data, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl ProtocolMessage for ExecutorInfo {
    const TYPE_NAME: &'static str = "ExecutorInfo";
}

/// Describes the framework the executor belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub user: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FrameworkId>,
    #[serde(default)]
    pub failover_timeout: f64,
    #[serde(default)]
    pub checkpoint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl ProtocolMessage for FrameworkInfo {
    const TYPE_NAME: &'static str = "FrameworkInfo";
}

/// Describes the slave the executor was launched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaveInfo {
    pub hostname: String,
    #[serde(default = "default_slave_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SlaveId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub checkpoint: bool,
}

fn default_slave_port() -> u16 {
    5051
}

impl ProtocolMessage for SlaveInfo {
    const TYPE_NAME: &'static str = "SlaveInfo";
}

/// Describes a task the executor is asked to launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: String,
    pub task_id: TaskId,
    pub slave_id: SlaveId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl ProtocolMessage for TaskInfo {
    const TYPE_NAME: &'static str = "TaskInfo";
}

// ---------------------------------------------------------------------------
// Status updates (reply path)
// ---------------------------------------------------------------------------

/// Task lifecycle states reported back through the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    TaskStaging,
    TaskStarting,
    TaskRunning,
    TaskFinished,
    TaskFailed,
    TaskKilled,
    TaskLost,
}

impl TaskState {
    /// Whether no further updates follow this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::TaskFinished
                | TaskState::TaskFailed
                | TaskState::TaskKilled
                | TaskState::TaskLost
        )
    }
}

/// A status update the handler sends for one of its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<SlaveId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl ProtocolMessage for TaskStatus {
    const TYPE_NAME: &'static str = "TaskStatus";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_status_accepts_minimal_record() {
        let status: TaskStatus = serde_json::from_value(json!({
            "task_id": {"value": "t-1"},
            "state": "TASK_RUNNING",
        }))
        .unwrap();
        assert_eq!(status.task_id, TaskId::new("t-1"));
        assert_eq!(status.state, TaskState::TaskRunning);
        assert!(status.message.is_none());
    }

    #[test]
    fn absent_optionals_are_not_serialized() {
        let info = TaskInfo {
            name: "sleep".into(),
            task_id: TaskId::new("t-1"),
            slave_id: SlaveId::new("s-1"),
            resources: vec![],
            executor: None,
            command: None,
            data: None,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            json!({"name": "sleep", "task_id": {"value": "t-1"}, "slave_id": {"value": "s-1"}})
        );
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::TaskFinished.is_terminal());
        assert!(TaskState::TaskLost.is_terminal());
        assert!(!TaskState::TaskRunning.is_terminal());
        assert!(!TaskState::TaskStaging.is_terminal());
    }

    #[test]
    fn declared_type_names() {
        assert_eq!(TaskId::TYPE_NAME, "TaskID");
        assert_eq!(TaskInfo::TYPE_NAME, "TaskInfo");
        assert_eq!(SlaveInfo::TYPE_NAME, "SlaveInfo");
    }
}
