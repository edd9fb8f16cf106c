//! Event Renderer: GitHub event + payload into a [`Notification`].

use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::notification::{
    COLOR_AMBER, COLOR_BLUE, COLOR_GRAY, COLOR_GREEN, COLOR_PURPLE, COLOR_RED, Notification,
};
use crate::utils::{branch_name, title_case, truncate_with_ellipsis};
use crate::webhook::{GitHubEvent, IssuesEvent, PullRequestEvent, PushEvent, RefEvent, ReleaseEvent};

pub const MAX_COMMIT_MESSAGE_LEN: usize = 100;
pub const MAX_BODY_LEN: usize = 500;
pub const MAX_LABELS: usize = 5;

/// Renders `payload` as a notification.
///
/// Returns `None` for unsupported event types and for payloads that can't be
/// decoded; the latter is logged as an error.
pub fn render(event_type: &str, payload: Value) -> Option<Notification> {
    match try_render(event_type, payload) {
        Ok(notification) => notification,
        Err(e) => {
            error!(
                "Error creating notification for {} event: {}",
                event_type, e
            );
            None
        }
    }
}

/// Like [`render`], but hands decode failures back to the caller.
pub fn try_render(event_type: &str, payload: Value) -> Result<Option<Notification>> {
    let Some(event) = GitHubEvent::from_payload(event_type, payload)? else {
        info!("Unsupported event type: {}", event_type);
        return Ok(None);
    };
    debug!("decoded {} event: {:?}", event_type, event);

    let notification = match event {
        GitHubEvent::Push(event) => render_push(&event),
        GitHubEvent::PullRequest(event) => render_pull_request(&event),
        GitHubEvent::Issues(event) => render_issues(&event),
        GitHubEvent::Release(event) => render_release(&event),
        GitHubEvent::Create(event) => render_create(&event),
        GitHubEvent::Delete(event) => render_delete(&event),
    };

    Ok(Some(notification))
}

fn render_push(event: &PushEvent) -> Notification {
    let branch = branch_name(event.git_ref());
    let commits = event.commits();
    let pusher = &event.pusher;

    let mut notification = Notification::new(format!("📝 New Push to {}", branch), COLOR_GREEN)
        .description(format!(
            "**{} commit(s)** pushed to `{}`",
            commits.len(),
            event.repository.name()
        ))
        .link(event.compare_url())
        .field("Repository", event.repository.markdown_link(), true)
        .field("Pushed by", pusher.name(), true)
        .field("Commits", commits.len().to_string(), true);

    if let Some(latest) = commits.last() {
        let message = truncate_with_ellipsis(latest.message(), MAX_COMMIT_MESSAGE_LEN);
        notification = notification.field(
            "Latest Commit",
            format!("[{}]({})", message, latest.url()),
            false,
        );
    }

    notification
        .author(pusher.name(), pusher.avatar_url())
        .footer("Patchy - GitHub Push Event")
}

fn pull_request_color(action: &str) -> u32 {
    match action {
        "opened" => COLOR_GREEN,
        "closed" => COLOR_RED,
        "merged" => COLOR_PURPLE,
        "reopened" => COLOR_BLUE,
        _ => COLOR_GRAY,
    }
}

fn render_pull_request(event: &PullRequestEvent) -> Notification {
    let action = event.action();
    let pr = &event.pull_request;

    let mut notification = Notification::new(
        format!("🔀 Pull Request {}", title_case(action)),
        pull_request_color(action),
    )
    .description(format!("**{}**", pr.title()))
    .link(pr.html_url())
    .field(
        format!("PR #{}", pr.number()),
        format!("**{}**", title_case(pr.state())),
        true,
    )
    .field("Repository", event.repository.markdown_link(), true)
    .field("Author", pr.user.login(), true);

    if !pr.body().is_empty() {
        notification = notification.field(
            "Description",
            truncate_with_ellipsis(pr.body(), MAX_BODY_LEN),
            false,
        );
    }

    notification
        .author(pr.user.login(), pr.user.avatar_url())
        .footer("Patchy - GitHub Pull Request Event")
}

fn issue_color(action: &str) -> u32 {
    match action {
        "opened" => COLOR_RED,
        "closed" => COLOR_GREEN,
        "reopened" => COLOR_BLUE,
        _ => COLOR_GRAY,
    }
}

fn render_issues(event: &IssuesEvent) -> Notification {
    let action = event.action();
    let issue = &event.issue;

    let mut notification = Notification::new(
        format!("🐛 Issue {}", title_case(action)),
        issue_color(action),
    )
    .description(format!("**{}**", issue.title()))
    .link(issue.html_url())
    .field(
        format!("Issue #{}", issue.number()),
        format!("**{}**", title_case(issue.state())),
        true,
    )
    .field("Repository", event.repository.markdown_link(), true)
    .field("Author", issue.user.login(), true);

    let labels = issue.labels();
    if !labels.is_empty() {
        let names: Vec<&str> = labels.iter().take(MAX_LABELS).map(|l| l.name()).collect();
        notification = notification.field("Labels", names.join(", "), false);
    }

    notification
        .author(issue.user.login(), issue.user.avatar_url())
        .footer("Patchy - GitHub Issue Event")
}

fn render_release(event: &ReleaseEvent) -> Notification {
    let release = &event.release;

    let mut notification = Notification::new(
        format!("🚀 Release {}", title_case(event.action())),
        COLOR_AMBER,
    )
    .description(format!("**{}**", release.display_name()))
    .link(release.html_url())
    .field("Tag", release.tag_name(), true)
    .field("Repository", event.repository.markdown_link(), true)
    .field("Author", release.author.login(), true);

    if !release.body().is_empty() {
        notification = notification.field(
            "Description",
            truncate_with_ellipsis(release.body(), MAX_BODY_LEN),
            false,
        );
    }

    notification
        .author(release.author.login(), release.author.avatar_url())
        .footer("Patchy - GitHub Release Event")
}

fn render_create(event: &RefEvent) -> Notification {
    let emoji = match event.ref_type() {
        "branch" => "🌿",
        "tag" => "🏷️",
        _ => "📝",
    };

    Notification::new(
        format!("{} {} Created", emoji, title_case(event.ref_type())),
        COLOR_BLUE,
    )
    .description(format!(
        "**{}** created in `{}`",
        event.git_ref(),
        event.repository.name()
    ))
    .link(event.repository.html_url())
    .field("Repository", event.repository.markdown_link(), true)
    .field("Created by", event.sender.login(), true)
    .author(event.sender.login(), event.sender.avatar_url())
    .footer("Patchy - GitHub Create Event")
}

fn render_delete(event: &RefEvent) -> Notification {
    Notification::new(
        format!("🗑️ {} Deleted", title_case(event.ref_type())),
        COLOR_RED,
    )
    .description(format!(
        "**{}** deleted from `{}`",
        event.git_ref(),
        event.repository.name()
    ))
    .link(event.repository.html_url())
    .field("Repository", event.repository.markdown_link(), true)
    .field("Deleted by", event.sender.login(), true)
    .author(event.sender.login(), event.sender.avatar_url())
    .footer("Patchy - GitHub Delete Event")
}
