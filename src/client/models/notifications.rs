use std::borrow::Cow;

use crate::common::models::{Notification, NotificationKind, UserSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Heart,
    Speech,
    UserPlus,
    UserCheck,
    Badge,
    Bell,
}

/// Inline actions, only ever present on follow requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRequestActions {
    pub from_user_id: String,
}

/// What a notification row shows
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayIntent<'a> {
    pub notification: &'a Notification,
    pub glyph: Glyph,
    pub actor: Option<&'a UserSnapshot>,
    pub text: Cow<'a, str>,
    pub post_id: Option<&'a str>,
    pub actions: Option<FollowRequestActions>,
}

impl DisplayIntent<'_> {
    pub fn is_unread(&self) -> bool {
        !self.notification.is_read
    }
}

pub fn glyph(kind: NotificationKind) -> Glyph {
    match kind {
        NotificationKind::Like => Glyph::Heart,
        NotificationKind::Comment | NotificationKind::Message => Glyph::Speech,
        NotificationKind::Follow | NotificationKind::FollowRequest => Glyph::UserPlus,
        NotificationKind::FollowAccepted => Glyph::UserCheck,
        NotificationKind::Verification => Glyph::Badge,
        NotificationKind::Unknown => Glyph::Bell,
    }
}

/// Fixed text for a kind; `None` means the record's own content is shown
pub fn template(kind: NotificationKind) -> Option<&'static str> {
    match kind {
        NotificationKind::Like => Some("liked your post"),
        NotificationKind::Comment => Some("commented on your post"),
        NotificationKind::Follow => Some("started following you"),
        NotificationKind::FollowRequest => Some("wants to follow you"),
        NotificationKind::FollowAccepted => Some("accepted your follow request"),
        NotificationKind::Message => Some("sent you a message"),
        NotificationKind::Verification | NotificationKind::Unknown => None,
    }
}

pub fn project(notification: &Notification) -> DisplayIntent<'_> {
    let text = match template(notification.kind) {
        Some(fixed) => Cow::Borrowed(fixed),
        None => Cow::Borrowed(notification.content.as_str()),
    };
    // without a requester there is nobody to accept
    let actions = match (notification.kind, &notification.from_user) {
        (NotificationKind::FollowRequest, Some(from)) => Some(FollowRequestActions {
            from_user_id: from.id.clone(),
        }),
        _ => None,
    };
    DisplayIntent {
        notification,
        glyph: glyph(notification.kind),
        actor: notification.from_user.as_ref(),
        text,
        post_id: notification.post_id.as_deref(),
        actions,
    }
}

pub fn project_all(notifications: &[Notification]) -> Vec<DisplayIntent<'_>> {
    notifications.iter().map(project).collect()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}
