use std::ffi::CStr;
use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyModule};

use taskbridge_executor::test_support::RecordingDriver;
use taskbridge_executor::{
    DriverStatus, Executor, ExecutorDriver, GuardScope, SlaveId, TaskId, TaskInfo, TaskState,
};
use taskbridge_python::{PythonBridgeConfig, PythonExecutorBridge};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Instantiate `Handler` from a snippet of Python source.
fn handler(code: &CStr, module_name: &CStr) -> PyObject {
    Python::with_gil(|py| {
        let module = PyModule::from_code(py, code, c"handler.py", module_name).unwrap();
        module.getattr("Handler").unwrap().call0().unwrap().unbind()
    })
}

fn bridge(handler: &PyObject, config: PythonBridgeConfig) -> PythonExecutorBridge {
    let handler = Python::with_gil(|py| handler.clone_ref(py));
    PythonExecutorBridge::new(handler, config).unwrap()
}

fn attr<T: for<'py> FromPyObject<'py>>(handler: &PyObject, name: &str) -> T {
    Python::with_gil(|py| handler.bind(py).getattr(name).unwrap().extract().unwrap())
}

fn task_info() -> TaskInfo {
    TaskInfo {
        name: "sleep".into(),
        task_id: TaskId::new("task-1"),
        slave_id: SlaveId::new("slave-7"),
        resources: vec![],
        executor: None,
        command: None,
        data: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn launch_task_reaches_handler_and_status_flows_back() {
    let handler = handler(
        c"
class Handler:
    def __init__(self):
        self.tasks = []
        self.replies = []

    def launchTask(self, driver, task):
        self.tasks.append(task['task_id']['value'])
        self.replies.append(
            driver.sendStatusUpdate({'task_id': task['task_id'], 'state': 'TASK_RUNNING'})
        )
",
        c"handler_launch",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = Arc::new(RecordingDriver::new());
    bridge.attach(driver.clone());

    bridge.launch_task(driver.as_ref(), &task_info());

    assert_eq!(attr::<Vec<String>>(&handler, "tasks"), vec!["task-1"]);
    assert_eq!(
        attr::<Vec<String>>(&handler, "replies"),
        vec![DriverStatus::DriverRunning.as_str()]
    );
    let updates = driver.status_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].task_id, TaskId::new("task-1"));
    assert_eq!(updates[0].state, TaskState::TaskRunning);
    assert_eq!(driver.aborts(), 0);
}

#[test]
fn handler_replies_with_framework_message_and_abort() {
    let handler = handler(
        c"
class Handler:
    def frameworkMessage(self, driver, data):
        self.sent = driver.sendFrameworkMessage(data + b'\\x00z')
        self.aborted = driver.abort()
",
        c"handler_reply_bytes",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = Arc::new(RecordingDriver::new());
    bridge.attach(driver.clone());

    bridge.framework_message(driver.as_ref(), b"a\0b");

    assert_eq!(driver.messages(), vec![b"a\0b\0z".to_vec()]);
    assert_eq!(driver.aborts(), 1);
    assert_eq!(attr::<String>(&handler, "sent"), DriverStatus::DriverRunning.as_str());
    assert_eq!(attr::<String>(&handler, "aborted"), DriverStatus::DriverAborted.as_str());
    assert!(!bridge.proxy().runtime().has_message_module());
}

#[test]
fn raising_handler_aborts_driver() {
    let handler = handler(
        c"
class Handler:
    def launchTask(self, driver, task):
        raise RuntimeError('cannot launch')
",
        c"handler_raising",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();

    bridge.launch_task(&driver, &task_info());

    assert_eq!(driver.aborts(), 1);
}

#[test]
fn raising_error_handler_does_not_abort() {
    let handler = handler(
        c"
class Handler:
    def error(self, driver, message):
        raise RuntimeError('still broken')
",
        c"handler_error",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();

    bridge.error(&driver, b"lost connection to agent");

    assert_eq!(driver.aborts(), 0);
}

#[test]
fn missing_method_aborts_driver() {
    let handler = handler(
        c"
class Handler:
    pass
",
        c"handler_empty",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();

    bridge.kill_task(&driver, &TaskId::new("task-1"));

    assert_eq!(driver.aborts(), 1);
}

#[test]
fn system_exit_in_handler_is_contained() {
    let handler = handler(
        c"
import sys

class Handler:
    def shutdown(self, driver):
        sys.exit(3)
",
        c"handler_exit",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();

    bridge.shutdown(&driver);

    assert_eq!(driver.aborts(), 1);
}

#[test]
fn framework_message_keeps_nul_bytes() {
    let handler = handler(
        c"
class Handler:
    def frameworkMessage(self, driver, data):
        self.data = data
",
        c"handler_bytes",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();
    let payload = b"a\0b\0\0c";

    bridge.framework_message(&driver, payload);

    let received = Python::with_gil(|py| {
        let data = handler.bind(py).getattr("data").unwrap();
        data.downcast::<PyBytes>().unwrap().as_bytes().to_vec()
    });
    assert_eq!(received, payload);
    assert_eq!(driver.aborts(), 0);
}

#[test]
fn reply_before_attach_raises_in_handler() {
    let handler = handler(
        c"
class Handler:
    def disconnected(self, driver):
        self.attached = driver.attached
        driver.stop()
",
        c"handler_detached",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = RecordingDriver::new();

    bridge.disconnected(&driver);

    assert!(!attr::<bool>(&handler, "attached"));
    assert_eq!(driver.stops(), 0);
    assert_eq!(driver.aborts(), 1);
}

#[test]
fn malformed_status_is_rejected_with_value_error() {
    let handler = handler(
        c"
class Handler:
    def reregistered(self, driver, slave_info):
        self.hostname = slave_info['hostname']
        try:
            driver.sendStatusUpdate({'state': 'TASK_RUNNING'})
        except ValueError as e:
            self.rejected = str(e)
",
        c"handler_malformed",
    );
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver = Arc::new(RecordingDriver::new());
    bridge.attach(driver.clone());

    let slave = taskbridge_executor::SlaveInfo {
        hostname: "agent-7.local".into(),
        port: 5051,
        id: None,
        resources: vec![],
        checkpoint: false,
    };
    bridge.reregistered(driver.as_ref(), &slave);

    assert_eq!(attr::<String>(&handler, "hostname"), "agent-7.local");
    assert!(attr::<String>(&handler, "rejected").contains("TaskStatus"));
    assert!(driver.status_updates().is_empty());
    assert_eq!(driver.aborts(), 0);
}

#[test]
fn message_module_classes_wrap_records() {
    Python::with_gil(|py| {
        PyModule::from_code(
            py,
            c"
class _Message:
    def __init__(self, **fields):
        self.__dict__.update(fields)

class TaskInfo(_Message):
    pass

class TaskStatus(_Message):
    pass
",
            c"tb_messages.py",
            c"tb_messages",
        )
        .unwrap();
    });
    let handler = handler(
        c"
import tb_messages

class Handler:
    def launchTask(self, driver, task):
        self.kind = type(task).__name__
        driver.sendStatusUpdate(
            tb_messages.TaskStatus(task_id=task.task_id, state='TASK_FINISHED')
        )
",
        c"handler_messages",
    );
    let config = PythonBridgeConfig::default()
        .message_module("tb_messages")
        .guard_scope(GuardScope::PerBridge)
        .name("message-bridge");
    let bridge = bridge(&handler, config);
    let driver = Arc::new(RecordingDriver::new());
    bridge.attach(driver.clone());

    bridge.launch_task(driver.as_ref(), &task_info());

    assert_eq!(attr::<String>(&handler, "kind"), "TaskInfo");
    let updates = driver.status_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].state, TaskState::TaskFinished);
    assert_eq!(bridge.proxy().name(), "message-bridge");
    assert!(bridge.proxy().runtime().has_message_module());
}

#[test]
fn unknown_message_module_fails_construction() {
    let handler = handler(c"class Handler:\n    pass\n", c"handler_unknown_module");
    let handler = Python::with_gil(|py| handler.clone_ref(py));

    let result = PythonExecutorBridge::new(
        handler,
        PythonBridgeConfig::default().message_module("no_such_module_for_taskbridge"),
    );

    assert!(result.is_err());
}

#[test]
fn detach_returns_attached_driver() {
    let handler = handler(c"class Handler:\n    pass\n", c"handler_detach");
    let bridge = bridge(&handler, PythonBridgeConfig::default());
    let driver: Arc<dyn ExecutorDriver> = Arc::new(RecordingDriver::new());

    bridge.attach(driver);

    assert!(bridge.detach().is_some());
    assert!(bridge.detach().is_none());
}
