use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail};
use chrono::Utc;
use log::{info, warn};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use crate::client::app::ClientApp;
use crate::client::models::conversation::ComposeMode;
use crate::client::models::session::{SessionReader, Theme};
use crate::client::services::gateway::{AppealResolution, ConnectionKind, PostTab, ReportResolution};
use crate::client::services::media_service::MediaFile;
use crate::client::services::poller::PollEvent;
use crate::client::utils::time::{format_clock, format_relative};
use crate::client::views::chats::ChatsView;
use crate::client::views::conversation::ConversationView;
use crate::client::views::feed::FeedView;
use crate::client::views::moderation::ModerationView;
use crate::client::views::notifications::NotificationsView;
use crate::client::views::post_detail::PostDetailView;
use crate::client::views::profile::ProfileView;
use crate::common::error::ClientError;
use crate::common::models::{Post, StoryVisibility};

const HELP: &str = "\
Account:  /register <user> <email> <password>  /login <email> <password>  /logout  /me  /theme [key]
Feed:     /feed  /more  /like <n>  /repost <n>  /open <n>  /post <text>  /photo <path> [caption]
          /story <path> [all|followers|mutual]  /avatar <path>  /search <query>
Post:     /comment <text>  /reply <n> <text>  /clike <n>  /delete [n]  /hide  /report <reason>
Profile:  /user <name>  /follow  /block  /unblock  /tab posts|likes|reposts  /followers  /following  /friends
Inbox:    /notifications  /accept <n>  /reject <n>  /chats  /chat <user>
Chat:     <text> sends  /reply <n>  /edit <n>  /pin <n>  /cancel  /leave
Avatars:  /avatars  /primary <n>  /unavatar <n>   (on your own profile)
Admin:    /mod  /resolve <n> block|dismiss  /approve <n>  /decline <n>  /appeal-ok <n>  /appeal-no <n>  /lift <user>
Other:    /appeal <reason>  /verify <type>  /help  /quit";

/// Which numbered list `/like <n>` and friends refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Feed,
    Profile,
}

/// Splits `/name arg arg` into its parts; `None` for plain text
pub fn split_command(line: &str) -> Option<(&str, Vec<&str>)> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    Some((name, parts.collect()))
}

/// Reads a 1-based list position typed by the user
pub fn parse_index(arg: Option<&&str>, len: usize) -> anyhow::Result<usize> {
    let raw = arg.ok_or_else(|| anyhow!("missing item number"))?;
    let n: usize = raw.parse().map_err(|_| anyhow!("'{}' is not a number", raw))?;
    if n == 0 || n > len {
        bail!("no item {} (list has {})", n, len);
    }
    Ok(n - 1)
}

fn rest(args: &[&str], from: usize) -> String {
    args.get(from..).unwrap_or_default().join(" ")
}

/// Interactive terminal front end
pub struct CliClient {
    app: ClientApp,
    feed: FeedView,
    notifications: NotificationsView,
    chats: ChatsView,
    post: Option<PostDetailView>,
    profile: Option<ProfileView>,
    chat: Option<ConversationView>,
    moderation: Option<ModerationView>,
    listing: Listing,
}

impl CliClient {
    pub fn new(app: ClientApp) -> Self {
        let gateway = app.gateway.clone();
        Self {
            feed: FeedView::new(gateway.clone()),
            notifications: NotificationsView::new(gateway.clone()),
            chats: ChatsView::new(gateway),
            post: None,
            profile: None,
            chat: None,
            moderation: None,
            listing: Listing::Feed,
            app,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        println!("[CLIENT] Welcome to Buzzzy. Type /help for commands.");
        match self.app.auth.restore().await {
            Some(user) => {
                println!("[CLIENT] Signed in as @{}", user.username);
                if user.is_blocked {
                    println!("[CLIENT] This account is blocked. Use /appeal <reason> to request a review.");
                }
            }
            None => println!("[CLIENT] Not signed in. Use /login or /register."),
        }

        let mut lines = BufReader::new(stdin()).lines();
        loop {
            prompt(self.chat.is_some());
            let line = tokio::select! {
                line = lines.next_line() => line?,
                Some(event) = next_chat_event(&mut self.chat) => {
                    self.show_chat_event(event);
                    continue;
                }
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match self.handle_line(&line).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("[CLIENT] {}", e),
            }
        }

        if let Some(mut chat) = self.chat.take() {
            chat.close();
        }
        info!("CLI session ended");
        Ok(())
    }

    /// Returns `false` when the user asked to quit
    async fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        let Some((name, args)) = split_command(line) else {
            return self.chat_text(line).await.map(|_| true);
        };

        if self.chat.is_some() && self.chat_command(name, &args).await? {
            return Ok(true);
        }

        match name {
            "/help" => println!("{}", HELP),
            "/quit" | "/exit" => return Ok(false),
            "/register" if args.len() == 3 => {
                let user = self.app.auth.register(args[0], args[1], args[2]).await?;
                println!("[CLIENT] Welcome, @{}", user.username);
            }
            "/login" if args.len() == 2 => self.login(args[0], args[1]).await?,
            "/logout" => {
                if let Some(mut chat) = self.chat.take() {
                    chat.close();
                }
                self.app.auth.logout().await;
                self.post = None;
                self.profile = None;
                self.moderation = None;
                println!("[CLIENT] Signed out");
            }
            "/me" => {
                let user = self.app.auth.refresh().await?;
                println!(
                    "@{} ({}){}{}",
                    user.username,
                    user.email,
                    if user.is_admin { " [admin]" } else { "" },
                    if user.is_verified { " [verified]" } else { "" }
                );
            }
            "/theme" => self.theme(args.first().copied()),
            "/feed" => {
                self.require_login()?;
                self.feed.load().await;
                self.listing = Listing::Feed;
                self.print_stories();
                print_posts(&self.feed.posts(), 0);
            }
            "/more" => {
                self.require_login()?;
                let before = self.feed.posts().len();
                let added = self.feed.load_more().await;
                if added == 0 {
                    println!("[CLIENT] No more posts");
                } else {
                    print_posts(&self.feed.posts()[before..], before);
                }
            }
            "/like" | "/repost" if !args.is_empty() => self.toggle_listed(name, &args)?,
            "/like" if self.post.is_some() => {
                if let Some(post) = self.post.as_mut() {
                    post.toggle_like();
                }
                self.print_post_detail();
            }
            "/repost" if self.post.is_some() => {
                if let Some(post) = self.post.as_mut() {
                    post.toggle_repost();
                }
                self.print_post_detail();
            }
            "/open" => {
                let posts = self.listed_posts();
                let idx = parse_index(args.first(), posts.len())?;
                let mut view = PostDetailView::new(self.app.gateway.clone(), &posts[idx].id);
                view.load().await;
                self.post = Some(view);
                self.print_post_detail();
            }
            "/post" if !args.is_empty() => {
                self.require_login()?;
                self.app.media.publish_post(&rest(&args, 0), None).await?;
                println!("[CLIENT] Posted");
            }
            "/photo" if !args.is_empty() => {
                self.require_login()?;
                let file = MediaFile::read(Path::new(args[0]))?;
                self.app.media.publish_post(&rest(&args, 1), Some(&file)).await?;
                println!("[CLIENT] Photo posted");
            }
            "/story" if !args.is_empty() => {
                self.require_login()?;
                let visibility = match args.get(1).copied() {
                    None | Some("all") => StoryVisibility::All,
                    Some("followers") => StoryVisibility::Followers,
                    Some("mutual") => StoryVisibility::Mutual,
                    Some(other) => bail!("unknown visibility '{}'", other),
                };
                let file = MediaFile::read(Path::new(args[0]))?;
                self.app.media.publish_story(&file, visibility).await?;
                println!("[CLIENT] Story published ({})", visibility.as_str());
            }
            "/avatar" if args.len() == 1 => {
                self.require_login()?;
                let file = MediaFile::read(Path::new(args[0]))?;
                self.app.media.set_avatar(&file).await?;
                println!("[CLIENT] Avatar updated");
            }
            "/search" if !args.is_empty() => {
                for user in self.chats.search(&rest(&args, 0)).await {
                    println!("  @{} {}", user.username, user.shown_name());
                }
            }
            "/comment" if !args.is_empty() => {
                let view = self.post.as_mut().ok_or_else(|| anyhow!("open a post first"))?;
                view.composer.reply_to = None;
                view.composer.text = rest(&args, 0);
                view.submit_comment().await?;
                self.print_post_detail();
            }
            "/reply" if args.len() >= 2 => {
                let view = self.post.as_mut().ok_or_else(|| anyhow!("open a post first"))?;
                let id = {
                    let thread = view.thread();
                    let idx = parse_index(args.first(), thread.len())?;
                    thread.entries()[idx].comment.id.clone()
                };
                view.start_reply(&id);
                view.composer.text.push_str(&rest(&args, 1));
                view.submit_comment().await?;
                self.print_post_detail();
            }
            "/clike" => {
                let view = self.post.as_mut().ok_or_else(|| anyhow!("open a post first"))?;
                let id = {
                    let thread = view.thread();
                    let idx = parse_index(args.first(), thread.len())?;
                    thread.entries()[idx].comment.id.clone()
                };
                view.toggle_comment_like(&id);
                self.print_post_detail();
            }
            "/delete" => self.delete(&args).await?,
            "/hide" => {
                let session = self.app.session.clone();
                let view = self.post.as_mut().ok_or_else(|| anyhow!("open a post first"))?;
                if !view.can_admin_hide(session.as_ref()) {
                    bail!("only moderators can hide other people's posts");
                }
                view.admin_hide().await?;
                println!("[CLIENT] Post hidden");
            }
            "/report" if !args.is_empty() => {
                let view = self.post.as_ref().ok_or_else(|| anyhow!("open a post first"))?;
                view.report(&rest(&args, 0)).await?;
                println!("[CLIENT] Report sent");
            }
            "/user" if args.len() == 1 => {
                let mut view = ProfileView::new(self.app.gateway.clone(), args[0].trim_start_matches('@'));
                view.load().await;
                self.profile = Some(view);
                self.listing = Listing::Profile;
                self.print_profile();
            }
            "/follow" => {
                let view = self.profile.as_mut().ok_or_else(|| anyhow!("open a profile first"))?;
                if let Some(handle) = view.toggle_follow() {
                    tokio::spawn(async move {
                        if let Ok(Err(e)) = handle.await {
                            warn!("follow request failed: {}", e);
                        }
                    });
                }
                println!("[CLIENT] {} ({} followers)", view.follow_label(), view.followers());
            }
            "/block" | "/unblock" => {
                let view = self.profile.as_ref().ok_or_else(|| anyhow!("open a profile first"))?;
                view.set_blocked(name == "/block").await?;
                println!("[CLIENT] Done");
            }
            "/tab" if args.len() == 1 => {
                let tab = match args[0] {
                    "posts" => PostTab::Posts,
                    "likes" => PostTab::Likes,
                    "reposts" => PostTab::Reposts,
                    other => bail!("unknown tab '{}'", other),
                };
                let view = self.profile.as_mut().ok_or_else(|| anyhow!("open a profile first"))?;
                view.select_tab(tab).await;
                self.listing = Listing::Profile;
                print_posts(&view.posts(), 0);
            }
            "/followers" | "/following" | "/friends" => {
                let kind = match name {
                    "/followers" => ConnectionKind::Followers,
                    "/following" => ConnectionKind::Following,
                    _ => ConnectionKind::Friends,
                };
                let view = self.profile.as_ref().ok_or_else(|| anyhow!("open a profile first"))?;
                for user in view.connections(kind).await {
                    println!("  @{} {}", user.username, user.shown_name());
                }
            }
            "/notifications" => {
                self.require_login()?;
                self.notifications.load().await;
                self.print_notifications();
            }
            "/accept" | "/reject" => {
                let from_user_id = {
                    let intents = self.notifications.intents();
                    let idx = parse_index(args.first(), intents.len())?;
                    intents[idx]
                        .actions
                        .as_ref()
                        .map(|a| a.from_user_id.clone())
                        .ok_or_else(|| anyhow!("that notification is not a follow request"))?
                };
                if name == "/accept" {
                    self.notifications.accept(&from_user_id).await?;
                } else {
                    self.notifications.reject(&from_user_id).await?;
                }
                self.print_notifications();
            }
            "/chats" => {
                self.require_login()?;
                self.chats.load().await;
                for chat in self.chats.chats() {
                    let unread = if chat.unread > 0 { format!(" ({} new)", chat.unread) } else { String::new() };
                    println!(
                        "  @{}{}: {} · {}",
                        chat.username,
                        unread,
                        chat.last_message,
                        format_relative(chat.last_time, Utc::now())
                    );
                }
            }
            "/chat" if args.len() == 1 => self.open_chat(args[0]).await?,
            "/avatars" => self.print_avatars()?,
            "/primary" | "/unavatar" => {
                let session = self.app.session.clone();
                let view = self.profile.as_mut().ok_or_else(|| anyhow!("open a profile first"))?;
                let id = {
                    let avatars = view.avatars();
                    let idx = parse_index(args.first(), avatars.len())?;
                    avatars[idx].id.clone()
                };
                if name == "/primary" {
                    view.set_primary_avatar(session.as_ref(), &id).await?;
                } else {
                    view.remove_avatar(session.as_ref(), &id).await?;
                }
                self.print_avatars()?;
            }
            "/mod" => {
                let mut view = ModerationView::open(self.app.gateway.clone(), self.app.session.as_ref())?;
                view.load().await;
                self.moderation = Some(view);
                self.print_moderation();
            }
            "/resolve" if args.len() == 2 => {
                let resolution = match args[1] {
                    "block" => ReportResolution::Block,
                    "dismiss" => ReportResolution::Dismiss,
                    other => bail!("unknown resolution '{}'", other),
                };
                let view = self.moderation.as_mut().ok_or_else(|| anyhow!("open /mod first"))?;
                let id = {
                    let idx = parse_index(args.first(), view.reports().len())?;
                    view.reports()[idx].id.clone()
                };
                view.resolve_report(&id, resolution).await?;
                self.print_moderation();
            }
            "/approve" | "/decline" => {
                let view = self.moderation.as_mut().ok_or_else(|| anyhow!("open /mod first"))?;
                let id = {
                    let idx = parse_index(args.first(), view.verifications().len())?;
                    view.verifications()[idx].id.clone()
                };
                if name == "/approve" {
                    view.approve_verification(&id).await?;
                } else {
                    view.reject_verification(&id).await?;
                }
                self.print_moderation();
            }
            "/appeal-ok" | "/appeal-no" => {
                let resolution = if name == "/appeal-ok" {
                    AppealResolution::Approve
                } else {
                    AppealResolution::Reject
                };
                let view = self.moderation.as_mut().ok_or_else(|| anyhow!("open /mod first"))?;
                let id = {
                    let idx = parse_index(args.first(), view.appeals().len())?;
                    view.appeals()[idx].id.clone()
                };
                view.resolve_appeal(&id, resolution).await?;
                self.print_moderation();
            }
            "/lift" if args.len() == 1 => {
                let view = self.moderation.as_ref().ok_or_else(|| anyhow!("open /mod first"))?;
                let user_id = self.app.gateway.profile(args[0].trim_start_matches('@')).await?.id;
                view.unblock_user(&user_id).await?;
                println!("[CLIENT] Block lifted");
            }
            "/appeal" if !args.is_empty() => {
                self.require_login()?;
                self.app.gateway.appeal(&rest(&args, 0)).await?;
                println!("[CLIENT] Appeal sent");
            }
            "/verify" if args.len() == 1 => {
                self.require_login()?;
                self.app.gateway.request_verification(args[0]).await?;
                println!("[CLIENT] Verification requested");
            }
            _ => println!("[CLIENT] Unknown command or bad arguments. Type /help"),
        }
        Ok(true)
    }

    async fn login(&mut self, email: &str, password: &str) -> anyhow::Result<()> {
        match self.app.auth.login(email, password).await {
            Ok(user) => println!("[CLIENT] Signed in as @{}", user.username),
            Err(ClientError::Blocked { block_count }) => {
                println!(
                    "[CLIENT] This account is blocked (blocked {} time(s)). Appeals can be sent with /appeal from an active session.",
                    block_count
                );
            }
            Err(ClientError::Auth(_)) => println!("[CLIENT] Wrong email or password"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn require_login(&self) -> anyhow::Result<()> {
        if self.app.session.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated.into())
        }
    }

    fn theme(&self, key: Option<&str>) {
        match key {
            None => {
                let current = self.app.session.theme();
                for theme in Theme::ALL {
                    let mark = if theme == current { "*" } else { " " };
                    println!(" {} {}", mark, theme.key());
                }
            }
            Some(key) => match Theme::from_key(key) {
                Some(theme) => {
                    self.app.session.set_theme(theme);
                    println!("[CLIENT] Theme set to {}", theme.key());
                }
                None => println!("[CLIENT] Unknown theme '{}'", key),
            },
        }
    }

    fn listed_posts(&self) -> Vec<Post> {
        match (self.listing, &self.profile) {
            (Listing::Profile, Some(profile)) => profile.posts(),
            _ => self.feed.posts(),
        }
    }

    fn toggle_listed(&mut self, name: &str, args: &[&str]) -> anyhow::Result<()> {
        self.require_login()?;
        let posts = self.listed_posts();
        let idx = parse_index(args.first(), posts.len())?;
        let id = posts[idx].id.clone();
        let like = name == "/like";
        match (self.listing, self.profile.as_mut()) {
            (Listing::Profile, Some(profile)) => {
                if like {
                    profile.toggle_like(&id);
                } else {
                    profile.toggle_repost(&id);
                }
            }
            _ => {
                if like {
                    self.feed.toggle_like(&id);
                } else {
                    self.feed.toggle_repost(&id);
                }
            }
        }
        let shown = self
            .listed_posts()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("post disappeared"))?;
        print_posts(std::slice::from_ref(&shown), idx);
        Ok(())
    }

    async fn delete(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let session = self.app.session.clone();
        let view = self.post.as_mut().ok_or_else(|| anyhow!("open a post first"))?;
        if args.is_empty() {
            if !view.is_own_post(session.as_ref()) {
                bail!("you can only delete your own posts");
            }
            view.delete_post().await?;
            self.post = None;
            println!("[CLIENT] Post deleted");
            return Ok(());
        }
        let comment = {
            let thread = view.thread();
            let idx = parse_index(args.first(), thread.len())?;
            thread.entries()[idx].comment.clone()
        };
        if !view.can_delete_comment(session.as_ref(), &comment) {
            bail!("you cannot delete that comment");
        }
        view.delete_comment(&comment.id).await?;
        self.print_post_detail();
        Ok(())
    }

    async fn open_chat(&mut self, username: &str) -> anyhow::Result<()> {
        let viewer_id = self
            .app
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;
        let username = username.trim_start_matches('@');
        let partner_id = match self.chats.partner_by_username(username) {
            Some(chat) => chat.partner_id.clone(),
            None => self.app.gateway.profile(username).await?.id,
        };
        if let Some(mut previous) = self.chat.take() {
            previous.close();
        }
        self.chat = Some(ConversationView::open(
            self.app.gateway.clone(),
            &viewer_id,
            &partner_id,
            self.app.config.poll_interval,
            self.app.session.subscribe(),
        ));
        println!("[CLIENT] Chat with @{} open. Type to send, /leave to close.", username);
        Ok(())
    }

    /// Plain text: sends in a chat, otherwise a hint
    async fn chat_text(&mut self, line: &str) -> anyhow::Result<()> {
        let Some(chat) = self.chat.as_mut() else {
            println!("[CLIENT] Commands start with '/'. Type /help");
            return Ok(());
        };
        chat.conversation_mut().composer_mut().set_draft(line);
        chat.submit().await?;
        Ok(())
    }

    /// Chat-only commands; `false` lets the general table handle it
    async fn chat_command(&mut self, name: &str, args: &[&str]) -> anyhow::Result<bool> {
        let Some(chat) = self.chat.as_mut() else {
            return Ok(false);
        };
        match name {
            "/leave" => {
                chat.close();
                self.chat = None;
                println!("[CLIENT] Chat closed");
            }
            "/cancel" => {
                chat.conversation_mut().composer_mut().cancel();
                println!("[CLIENT] Back to a new message");
            }
            "/reply" | "/edit" | "/pin" => {
                let id = {
                    let messages = chat.conversation().messages();
                    let idx = parse_index(args.first(), messages.len())?;
                    messages[idx].id.clone()
                };
                match name {
                    "/reply" => {
                        chat.conversation_mut().start_reply(&id);
                    }
                    "/edit" => {
                        if !chat.conversation_mut().start_edit(&id) {
                            bail!("you can only edit your own messages");
                        }
                    }
                    _ => chat.toggle_pin(&id).await?,
                }
                if let Some(banner) = chat.conversation().compose_banner() {
                    println!("[CLIENT] {}", banner);
                }
                if let ComposeMode::Edit { .. } = chat.conversation().composer().mode() {
                    println!("[CLIENT] Current text: {}", chat.conversation().composer().draft());
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn show_chat_event(&mut self, event: PollEvent) {
        let Some(chat) = self.chat.as_ref() else {
            return;
        };
        match event {
            PollEvent::FetchFailed(e) => println!("[CLIENT] refresh failed: {}", e),
            PollEvent::Refreshed(_) => {
                let convo = chat.conversation();
                println!();
                if let Some(pinned) = convo.pinned_banner() {
                    println!("  📌 {}", pinned.content);
                }
                for (i, m) in convo.messages().iter().enumerate() {
                    let who = if convo.is_mine(m) { "you" } else { "them" };
                    if let Some(reply) = convo.resolve_reply(m) {
                        println!("       ↪ {}", reply.preview());
                    }
                    println!(
                        "  {:>3}. [{}] {}: {}{}{}",
                        i + 1,
                        format_clock(m.created_at),
                        who,
                        m.content,
                        if m.is_edited() { " (edited)" } else { "" },
                        if convo.shows_read_receipt(m) { " ✓✓" } else { "" }
                    );
                }
                for pending in convo.pending() {
                    println!("       … you: {}", pending.content);
                }
            }
        }
    }

    fn print_stories(&self) {
        let groups = self.feed.story_groups();
        if groups.is_empty() {
            return;
        }
        let strip: Vec<String> = groups
            .iter()
            .map(|g| format!("@{}({})", g.author.username, g.stories.len()))
            .collect();
        println!("Stories: {}", strip.join("  "));
    }

    fn print_post_detail(&self) {
        let Some(view) = self.post.as_ref() else {
            return;
        };
        let Some(post) = view.post() else {
            println!("[CLIENT] Post not found");
            return;
        };
        print_posts(std::slice::from_ref(&post), 0);
        println!("  Comments ({})", view.comment_count());
        let thread = view.thread();
        for (i, entry) in thread.iter().enumerate() {
            let indent = " ".repeat(4 + entry.depth * 2);
            let (liked, likes) = view.comment_like(&entry.comment.id).unwrap_or_default();
            println!(
                "{}{}. @{}: {}  {}{}{}",
                indent,
                i + 1,
                entry.comment.user.username,
                entry.comment.content,
                if liked { "♥" } else { "♡" },
                likes,
                if entry.comment.is_author_like { " (author)" } else { "" }
            );
        }
    }

    fn print_profile(&self) {
        let Some(view) = self.profile.as_ref() else {
            return;
        };
        let Some(profile) = view.state().ready() else {
            println!("[CLIENT] User not found");
            return;
        };
        println!(
            "@{} {}{}{}",
            profile.username,
            profile.display_name,
            if profile.is_verified { " ✔" } else { "" },
            if profile.is_private { " 🔒" } else { "" }
        );
        if let Some(bio) = &profile.bio {
            println!("  {}", bio);
        }
        println!(
            "  {} posts · {} followers · {} following",
            profile.posts_count,
            view.followers(),
            profile.following_count
        );
        if !view.is_own(self.app.session.as_ref()) {
            println!("  [{}]", view.follow_label());
        }
        print_posts(&view.posts(), 0);
    }

    fn print_avatars(&self) -> anyhow::Result<()> {
        let view = self.profile.as_ref().ok_or_else(|| anyhow!("open a profile first"))?;
        for (i, avatar) in view.avatars().iter().enumerate() {
            let mark = if avatar.is_primary { " (primary)" } else { "" };
            println!("  {:>3}. {}{}", i + 1, avatar.url, mark);
        }
        Ok(())
    }

    fn print_moderation(&self) {
        let Some(view) = self.moderation.as_ref() else {
            return;
        };
        let now = Utc::now();
        println!("Reports:");
        for (i, r) in view.reports().iter().enumerate() {
            println!(
                "  {:>3}. [{}] by @{} · {}: {}",
                i + 1,
                r.target_type,
                r.reporter,
                format_relative(r.created_at, now),
                r.reason
            );
        }
        println!("Verification requests:");
        for (i, v) in view.verifications().iter().enumerate() {
            println!("  {:>3}. @{} wants {}", i + 1, v.username, v.kind);
        }
        println!("Appeals:");
        for (i, a) in view.appeals().iter().enumerate() {
            println!("  {:>3}. @{}: {}", i + 1, a.username, a.reason);
        }
    }

    fn print_notifications(&self) {
        let now = Utc::now();
        for (i, intent) in self.notifications.intents().iter().enumerate() {
            let actor = intent.actor.map(|u| format!("@{} ", u.username)).unwrap_or_default();
            let actions = if intent.actions.is_some() { "  [/accept | /reject]" } else { "" };
            println!(
                "  {:>3}. {}{}{} · {}{}",
                i + 1,
                if intent.is_unread() { "• " } else { "" },
                actor,
                intent.text,
                format_relative(intent.notification.created_at, now),
                actions
            );
        }
    }
}

async fn next_chat_event(chat: &mut Option<ConversationView>) -> Option<PollEvent> {
    match chat {
        Some(view) => view.next_event().await,
        None => std::future::pending().await,
    }
}

fn prompt(in_chat: bool) {
    print!("{}", if in_chat { "chat> " } else { "> " });
    let _ = std::io::stdout().flush();
}

fn print_posts(posts: &[Post], offset: usize) {
    let now = Utc::now();
    for (i, post) in posts.iter().enumerate() {
        println!(
            "{:>3}. @{} · {}",
            offset + i + 1,
            post.user.username,
            format_relative(post.created_at, now)
        );
        if !post.content.is_empty() {
            println!("     {}", post.content);
        }
        if let Some(image) = &post.image_url {
            println!("     [image] {}", image);
        }
        println!(
            "     {}{} · ⟳{} · 💬{} · 👁{}",
            if post.liked { "♥" } else { "♡" },
            post.likes_count,
            post.reposts_count,
            post.comments_count,
            post.views_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_commands_from_text() {
        assert_eq!(split_command("/like 3"), Some(("/like", vec!["3"])));
        assert_eq!(split_command("  /feed  "), Some(("/feed", vec![])));
        assert_eq!(split_command("hello there"), None);
    }

    #[test]
    fn indices_are_one_based_and_bounded() {
        assert_eq!(parse_index(Some(&"1"), 3).unwrap(), 0);
        assert_eq!(parse_index(Some(&"3"), 3).unwrap(), 2);
        assert!(parse_index(Some(&"0"), 3).is_err());
        assert!(parse_index(Some(&"4"), 3).is_err());
        assert!(parse_index(Some(&"x"), 3).is_err());
        assert!(parse_index(None, 3).is_err());
    }

    #[test]
    fn rest_joins_trailing_words() {
        assert_eq!(rest(&["a", "b", "c"], 1), "b c");
        assert_eq!(rest(&["a"], 3), "");
    }
}
