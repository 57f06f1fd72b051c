use std::cell::Cell;
use std::rc::Rc;

/// Nested diagnostic log.
///
/// Groups nest: every `enter` is matched by one `exit`. Implementations must
/// never fail or block; the compositor does not check what they do.
pub trait LogSink {
    fn enter(&self, name: &str);
    fn log(&self, line: &str);
    fn exit(&self);
}

/// Sink that writes indented lines to the `log` facade at debug level
/// under the `veneer::trace` target.
#[derive(Debug, Default)]
pub struct LogTree {
    depth: Cell<usize>,
}

impl LogTree {
    pub const TARGET: &'static str = "veneer::trace";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

impl LogSink for LogTree {
    fn enter(&self, name: &str) {
        let depth = self.depth.get();
        log::debug!(target: Self::TARGET, "{:indent$}{name} {{", "", indent = depth * 2);
        self.depth.set(depth + 1);
    }

    fn log(&self, line: &str) {
        let depth = self.depth.get();
        log::debug!(target: Self::TARGET, "{:indent$}{line}", "", indent = depth * 2);
    }

    fn exit(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        log::debug!(target: Self::TARGET, "{:indent$}}}", "", indent = depth * 2);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn enter(&self, _name: &str) {}
    fn log(&self, _line: &str) {}
    fn exit(&self) {}
}

/// Open group on a sink; closes it when dropped, including on early return.
#[must_use = "the group closes as soon as the guard is dropped"]
pub struct TraceGroup {
    sink: Rc<dyn LogSink>,
}

impl TraceGroup {
    pub fn enter(sink: &Rc<dyn LogSink>, name: &str) -> Self {
        sink.enter(name);
        Self {
            sink: Rc::clone(sink),
        }
    }

    pub fn log(&self, line: &str) {
        self.sink.log(line);
    }
}

impl Drop for TraceGroup {
    fn drop(&mut self) {
        self.sink.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl LogSink for Recorder {
        fn enter(&self, name: &str) {
            self.0.borrow_mut().push(format!("enter {name}"));
        }
        fn log(&self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }
        fn exit(&self) {
            self.0.borrow_mut().push("exit".to_string());
        }
    }

    #[test]
    fn guard_closes_group_on_drop() {
        let recorder = Rc::new(Recorder::default());
        let sink: Rc<dyn LogSink> = recorder.clone();
        {
            let outer = TraceGroup::enter(&sink, "render");
            outer.log("bind");
            let _inner = TraceGroup::enter(&sink, "paint");
        }
        assert_eq!(
            *recorder.0.borrow(),
            ["enter render", "bind", "enter paint", "exit", "exit"]
        );
    }

    #[test]
    fn log_tree_tracks_depth() {
        let tree = LogTree::new();
        tree.enter("a");
        tree.enter("b");
        assert_eq!(tree.depth(), 2);
        tree.exit();
        tree.exit();
        tree.exit();
        assert_eq!(tree.depth(), 0);
    }
}
