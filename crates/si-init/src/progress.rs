//! Per-element progress events.

/// Where an element is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementStage {
    Started,
    Converged,
    Failed,
}

/// Emitted synchronously by
/// [`initialize_with_progress`](crate::initialize_with_progress).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementEvent {
    pub index: usize,
    pub count: usize,
    pub t_start: f64,
    pub t_end: f64,
    pub stage: ElementStage,
}

pub(crate) struct Progress<'a> {
    observer: Option<&'a mut dyn FnMut(&ElementEvent)>,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(observer: Option<&'a mut dyn FnMut(&ElementEvent)>) -> Self {
        Self { observer }
    }

    pub(crate) fn emit(&mut self, event: ElementEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }
}
