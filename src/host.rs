/// Sidebar host state: frame existence and visibility within one page
///
/// The host never touches the DOM itself. Each operation updates state and
/// returns the effects the content script must apply, in order.
use crate::protocol::{FrameMessage, PageEmails, RuntimeMessage, ToggleReply};

#[derive(Debug, Clone, PartialEq)]
pub enum HostEffect {
    /// Create the frame (off-screen) and attach it to the page
    CreateFrame,
    /// Slide the frame into view
    Reveal,
    /// Slide the frame out of view, keeping it alive
    SlideOut,
    /// Detect emails after a delay and push them into the frame
    SchedulePush { delay_ms: u32 },
    /// Push this snapshot into the frame now
    PushEmails(PageEmails),
}

/// Synchronous reply to a runtime message addressed to the page
#[derive(Debug, Clone, PartialEq)]
pub enum HostReply {
    Toggled(ToggleReply),
    Emails(PageEmails),
}

#[derive(Debug, Clone)]
pub struct SidebarHost {
    frame_created: bool,
    visible: bool,
    push_delay_ms: u32,
}

impl SidebarHost {
    pub fn new(push_delay_ms: u32) -> SidebarHost {
        SidebarHost {
            frame_created: false,
            visible: false,
            push_delay_ms,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_frame(&self) -> bool {
        self.frame_created
    }

    pub fn show(&mut self) -> Vec<HostEffect> {
        let mut effects = Vec::new();

        if !self.frame_created {
            self.frame_created = true;
            effects.push(HostEffect::CreateFrame);
            effects.push(HostEffect::SchedulePush {
                delay_ms: self.push_delay_ms,
            });
        }

        if !self.visible {
            self.visible = true;
            effects.push(HostEffect::Reveal);
        }

        effects
    }

    pub fn hide(&mut self) -> Vec<HostEffect> {
        if self.visible {
            self.visible = false;
            vec![HostEffect::SlideOut]
        } else {
            Vec::new()
        }
    }

    pub fn toggle(&mut self) -> Vec<HostEffect> {
        if self.visible { self.hide() } else { self.show() }
    }

    /// Handle a request posted from inside the frame
    pub fn handle_frame_message(
        &mut self,
        message: &FrameMessage,
        snapshot: impl FnOnce() -> PageEmails,
    ) -> Vec<HostEffect> {
        match message {
            FrameMessage::CloseSidebar => self.hide(),
            FrameMessage::RefreshEmails => vec![HostEffect::PushEmails(snapshot())],
            // Our own push, echoed on the shared window
            FrameMessage::DetectedEmails(_) => Vec::new(),
        }
    }

    /// Handle a message sent to this page by the background relay
    pub fn handle_runtime_message(
        &mut self,
        message: RuntimeMessage,
        snapshot: impl FnOnce() -> PageEmails,
    ) -> (Vec<HostEffect>, Option<HostReply>) {
        match message {
            RuntimeMessage::ToggleSidebar => (
                self.toggle(),
                Some(HostReply::Toggled(ToggleReply { success: true })),
            ),
            RuntimeMessage::DetectEmails => (Vec::new(), Some(HostReply::Emails(snapshot()))),
            RuntimeMessage::GetActiveTab | RuntimeMessage::DetectEmailsInTab => (Vec::new(), None),
        }
    }
}

/// Whether a postMessage origin belongs to this extension.
///
/// `extension_base` is `chrome.runtime.getURL("")`, e.g.
/// `chrome-extension://abcdef/`, while event origins carry no trailing slash.
pub fn is_extension_origin(origin: &str, extension_base: &str) -> bool {
    let base = extension_base.trim_end_matches('/');
    !base.is_empty() && origin == base
}
