//! Per-round log of deleted outputs and compiled sources.
//!
//! ```text
//! Cleaning output files:
//! com/example/A.class
//! End of files
//! Compiling files:
//! src/com/example/A.java
//! End of files
//! ```

/// Receives build events as they happen.
pub trait BuildProcessLogger {
    fn is_enabled(&self) -> bool;

    fn log_deleted_paths(&mut self, paths: Vec<String>);

    fn log_compiled_paths(&mut self, files: Vec<String>, builder_id: &str, description: &str);

    /// Everything logged so far, as text.
    fn collected_data(&mut self) -> String;
}

/// Renders events as text sections.
#[derive(Debug, Default)]
pub struct TextBuildProcessLogger {
    out: String,
}

impl TextBuildProcessLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn section(&mut self, header: &str, mut paths: Vec<String>) {
        paths.sort();
        self.out.push_str(header);
        self.out.push('\n');
        for path in paths {
            self.out.push_str(&path);
            self.out.push('\n');
        }
        self.out.push_str("End of files\n");
    }
}

impl BuildProcessLogger for TextBuildProcessLogger {
    fn is_enabled(&self) -> bool {
        true
    }

    fn log_deleted_paths(&mut self, paths: Vec<String>) {
        if !paths.is_empty() {
            self.section("Cleaning output files:", paths);
        }
    }

    fn log_compiled_paths(&mut self, files: Vec<String>, builder_id: &str, description: &str) {
        if files.is_empty() {
            return;
        }
        for line in description.lines().filter(|l| !l.trim().is_empty()) {
            self.out.push_str(&format!("{builder_id}: {line}\n"));
        }
        self.section("Compiling files:", files);
    }

    fn collected_data(&mut self) -> String {
        self.out.clone()
    }
}

#[derive(Debug)]
enum PostponedEvent {
    Deleted(Vec<String>),
    Compiled {
        files: Vec<String>,
        builder_id: String,
        description: String,
    },
}

impl PostponedEvent {
    fn merge_deleted(&mut self, paths: &mut Vec<String>) -> bool {
        match self {
            PostponedEvent::Deleted(existing) => {
                existing.append(paths);
                true
            }
            PostponedEvent::Compiled { .. } => false,
        }
    }

    fn merge_compiled(&mut self, other: &mut Vec<String>, other_builder: &str, other_description: &str) -> bool {
        match self {
            PostponedEvent::Compiled {
                files,
                builder_id,
                description,
            } if builder_id.as_str() == other_builder => {
                files.append(other);
                if !description.ends_with(other_description) {
                    description.push('\n');
                    description.push_str(other_description);
                }
                true
            }
            _ => false,
        }
    }

    fn process(self, target: &mut dyn BuildProcessLogger) {
        match self {
            PostponedEvent::Deleted(paths) => target.log_deleted_paths(paths),
            PostponedEvent::Compiled {
                files,
                builder_id,
                description,
            } => target.log_compiled_paths(files, &builder_id, &description),
        }
    }
}

/// Postpones events while a batch is active, merging consecutive deletions
/// and consecutive compilations by the same builder into one event.
pub struct BatchBuildProcessLogger<L> {
    delegate: L,
    batch_active: bool,
    events: Vec<PostponedEvent>,
}

impl<L: BuildProcessLogger> BatchBuildProcessLogger<L> {
    pub fn new(delegate: L) -> Self {
        Self {
            delegate,
            batch_active: false,
            events: Vec::new(),
        }
    }

    pub fn start_batch(&mut self) {
        self.batch_active = true;
    }

    /// End the batch and forward the merged events to the delegate.
    pub fn stop_batch(&mut self) {
        self.batch_active = false;
        for event in self.events.drain(..) {
            event.process(&mut self.delegate);
        }
    }

    pub fn into_inner(mut self) -> L {
        self.stop_batch();
        self.delegate
    }

    fn batching(&self) -> bool {
        self.batch_active && self.is_enabled()
    }
}

impl<L: BuildProcessLogger> BuildProcessLogger for BatchBuildProcessLogger<L> {
    fn is_enabled(&self) -> bool {
        self.delegate.is_enabled()
    }

    fn log_deleted_paths(&mut self, mut paths: Vec<String>) {
        if !self.batching() {
            self.delegate.log_deleted_paths(paths);
            return;
        }
        let merged = self
            .events
            .last_mut()
            .is_some_and(|last| last.merge_deleted(&mut paths));
        if !merged {
            self.events.push(PostponedEvent::Deleted(paths));
        }
    }

    fn log_compiled_paths(&mut self, mut files: Vec<String>, builder_id: &str, description: &str) {
        if !self.batching() {
            self.delegate.log_compiled_paths(files, builder_id, description);
            return;
        }
        let merged = self
            .events
            .last_mut()
            .is_some_and(|last| last.merge_compiled(&mut files, builder_id, description));
        if !merged {
            self.events.push(PostponedEvent::Compiled {
                files,
                builder_id: builder_id.to_string(),
                description: description.to_string(),
            });
        }
    }

    fn collected_data(&mut self) -> String {
        self.stop_batch();
        self.delegate.collected_data()
    }
}
