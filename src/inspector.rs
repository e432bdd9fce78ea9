//! Single-pick interaction state.
//!
//! At most one element is picked at a time. Picking replaces everything known
//! about the previous element; framework and component data arrive later and
//! are attached to whatever is picked at that moment.

use crate::browser::Inspection;
use crate::dom::ElementDescriptor;
use crate::framework::{ComponentNode, FrameworkSignal};
use crate::protocol::{CaptureResponse, CollectResult, InspectorMessage};
use crate::report::{ReportInput, compose_report};

/// Screenshot progress for the current pick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Ready(String),
    Failed(String),
}

impl CaptureState {
    pub fn data_url(&self) -> Option<&str> {
        match self {
            Self::Ready(url) => Some(url),
            _ => None,
        }
    }
}

/// Everything known about the picked element
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub page_url: String,
    pub page_title: String,
    pub element: ElementDescriptor,
    pub framework: Option<FrameworkSignal>,
    pub component: Option<ComponentNode>,
}

#[derive(Debug, Default)]
pub struct Inspector {
    active: bool,
    pick: Option<Pick>,
    capture: CaptureState,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a finished inspection as one pick: enter pick mode, pick the
    /// element and attach the page's framework and component data
    pub fn for_inspection(inspection: &Inspection) -> Self {
        let mut inspector = Self::new();
        inspector.handle(&InspectorMessage::Toggle);
        let request = inspector.begin_pick(&inspection.url, &inspection.title, inspection.element.clone());
        log::debug!("Collecting for {:?}", request);
        inspector.apply_collect_result(inspection.collect_result());
        inspector
    }

    /// Request a capture and store what `capture` returns
    pub fn capture_with(&mut self, capture: impl FnOnce() -> CaptureResponse) {
        if let Some(InspectorMessage::Capture) = self.handle(&InspectorMessage::Capture) {
            self.finish_capture(capture());
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pick(&self) -> Option<&Pick> {
        self.pick.as_ref()
    }

    pub fn capture_state(&self) -> &CaptureState {
        &self.capture
    }

    /// Dispatch an incoming message; returns the follow-up request, if any
    pub fn handle(&mut self, message: &InspectorMessage) -> Option<InspectorMessage> {
        match message {
            InspectorMessage::Toggle => {
                self.toggle();
                None
            }
            InspectorMessage::Capture => Some(self.start_capture()),
            InspectorMessage::Collect { .. } => {
                log::debug!("Ignoring collect request addressed to the page");
                None
            }
        }
    }

    /// Switch pick mode; switching off discards the current pick
    pub fn toggle(&mut self) -> bool {
        if self.active {
            self.discard();
        }
        self.active = !self.active;
        log::debug!("Pick mode {}", if self.active { "on" } else { "off" });
        self.active
    }

    /// Record a newly picked element and leave pick mode. Returns the request
    /// asking the page for framework and component data.
    pub fn begin_pick(
        &mut self,
        page_url: impl Into<String>,
        page_title: impl Into<String>,
        element: ElementDescriptor,
    ) -> InspectorMessage {
        let selector = element.selector.clone();
        self.pick = Some(Pick {
            page_url: page_url.into(),
            page_title: page_title.into(),
            element,
            framework: None,
            component: None,
        });
        self.capture = CaptureState::Idle;
        self.active = false;

        InspectorMessage::Collect { selector }
    }

    /// Attach the page's answer to the current pick
    pub fn apply_collect_result(&mut self, result: CollectResult) {
        match self.pick.as_mut() {
            Some(pick) => {
                pick.framework = result.framework;
                pick.component = result.component;
            }
            None => log::debug!("Collect result arrived with nothing picked"),
        }
    }

    pub fn start_capture(&mut self) -> InspectorMessage {
        self.capture = CaptureState::Capturing;
        InspectorMessage::Capture
    }

    pub fn finish_capture(&mut self, response: CaptureResponse) {
        self.capture = match (response.success, response.data_url) {
            (true, Some(url)) => CaptureState::Ready(url),
            (_, _) => {
                let error = response.error.unwrap_or_else(|| "capture returned no image".to_string());
                log::warn!("Screenshot capture failed: {}", error);
                CaptureState::Failed(error)
            }
        };
    }

    /// Close the result view
    pub fn close(&mut self) {
        self.discard();
    }

    /// Report for the current pick. Never waits on a pending capture.
    pub fn compose(&self, instruction: &str) -> Option<String> {
        let pick = self.pick.as_ref()?;
        Some(compose_report(&ReportInput {
            instruction,
            page_url: &pick.page_url,
            page_title: &pick.page_title,
            framework: pick.framework.as_ref(),
            element: &pick.element,
            component: pick.component.as_ref(),
        }))
    }

    fn discard(&mut self) {
        self.pick = None;
        self.capture = CaptureState::Idle;
    }
}
