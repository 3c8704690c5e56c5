//! Update dispatch and the daily congratulation pass.
//!
//! [`Bot`] owns every piece of mutable state (the roster, the remembered
//! chat, the greeted set) and is driven from a single task, one update at a
//! time.  Transport failures are logged and swallowed.

use std::collections::HashSet;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use nestbot_config::AppConfig;
use nestbot_core::render::{self, ADMINS_ONLY, DATE_ERROR, MENU_PROMPT};
use nestbot_core::{
    BotCommand, ChildRecord, EventRecord, GreetedSet, Input, MenuAction, Verdict, classify,
    due_greetings, moderation,
};
use nestbot_store::Roster;

use crate::chat::{
    CallbackPress, ChatApi, ChatId, IncomingMessage, Outgoing, TextFormat, Update, UserId,
};

pub struct Bot<A> {
    api: A,
    roster: Roster,
    config: AppConfig,
    /// Last chat that ran `/start` or `/menu`.
    main_chat: Option<ChatId>,
    /// The bot's own `@username`, for ignoring commands aimed at other bots.
    username: Option<String>,
    greeted: GreetedSet,
    rng: StdRng,
}

impl<A: ChatApi> Bot<A> {
    pub fn new(api: A, roster: Roster, config: AppConfig) -> Self {
        Self::with_rng(api, roster, config, StdRng::from_entropy())
    }

    pub fn with_rng(api: A, roster: Roster, config: AppConfig, rng: StdRng) -> Self {
        Self {
            api,
            roster,
            config,
            main_chat: None,
            username: None,
            greeted: GreetedSet::new(),
            rng,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn greeted(&self) -> &GreetedSet {
        &self.greeted
    }

    /// Target of the daily pass: the remembered chat, else the configured one.
    pub fn target_chat(&self) -> Option<ChatId> {
        self.main_chat.or(self.config.schedule.chat_id)
    }

    pub async fn handle_update(&mut self, update: Update, today: NaiveDate) {
        match update {
            Update::Message(message) => self.handle_message(message).await,
            Update::Callback(press) => self.handle_callback(press, today).await,
        }
    }

    async fn handle_message(&mut self, message: IncomingMessage) {
        if !message.new_members.is_empty() {
            self.greet_new_members(&message).await;
        }

        if let Some(text) = message.text.as_deref() {
            if text.trim_start().starts_with('/') {
                match BotCommand::parse(text, self.username.as_deref()) {
                    Some(command) => self.handle_command(command, &message).await,
                    None => debug!(text, "ignoring unknown or foreign command"),
                }
            } else {
                let input = classify(text);
                self.handle_input(input, &message).await;
            }
        }

        self.moderate(&message).await;
    }

    async fn handle_command(&mut self, command: BotCommand, message: &IncomingMessage) {
        let chat_id = message.chat_id;
        if command.remembers_chat() {
            self.main_chat = Some(chat_id);
            info!(chat_id, "remembered chat for daily greetings");
        }

        let reply = match command {
            BotCommand::Start | BotCommand::Menu => Outgoing::plain(chat_id, MENU_PROMPT).with_menu(),
            BotCommand::Tip => Outgoing::markdown(chat_id, render::random_tip(&mut self.rng)),
            BotCommand::Support => Outgoing::markdown(chat_id, render::random_support(&mut self.rng)),
            BotCommand::Help => Outgoing::markdown(chat_id, render::help()),
        };
        self.send(reply.replying_to(message.message_id)).await;
    }

    async fn handle_input(&mut self, input: Input, message: &IncomingMessage) {
        let chat_id = message.chat_id;
        let reply = match input {
            Input::PlainText => return,
            Input::AddChild { name, birth } => {
                let child = ChildRecord::new(name, birth);
                let text = render::child_added(&child);
                self.roster.add_child(child);
                Outgoing::markdown(chat_id, text)
            }
            Input::RemoveChild { name } => {
                let Some(user) = &message.from else {
                    return;
                };
                if !self.is_admin(chat_id, user.id).await {
                    info!(chat_id, user_id = user.id, name = %name, "rejected removal by non-admin");
                    Outgoing::plain(chat_id, ADMINS_ONLY)
                } else {
                    match self.roster.remove_child(&name) {
                        Some(_) => Outgoing::markdown(chat_id, render::child_removed(&name)),
                        None => Outgoing::markdown(chat_id, render::child_not_found(&name)),
                    }
                }
            }
            Input::AddEvent { title, date } => {
                let event = EventRecord::new(title, date);
                let text = render::event_added(&event);
                self.roster.add_event(event);
                Outgoing::markdown(chat_id, text)
            }
            Input::BadDate(err) => {
                debug!(%err, "rejected command date");
                Outgoing::plain(chat_id, DATE_ERROR)
            }
        };
        self.send(reply.replying_to(message.message_id)).await;
    }

    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> bool {
        match self.api.member_status(chat_id, user_id).await {
            Ok(status) => self.config.is_admin_status(&status),
            Err(err) => {
                debug!(chat_id, user_id, ?err, "member lookup failed; treating as non-admin");
                false
            }
        }
    }

    async fn moderate(&mut self, message: &IncomingMessage) {
        let Some(author) = &message.from else {
            return;
        };
        if author.is_bot {
            return;
        }
        let Some(text) = message.moderated_text() else {
            return;
        };

        match moderation::assess(text) {
            Verdict::Clean => {}
            Verdict::Support => {
                let reply = Outgoing::markdown(message.chat_id, render::random_support(&mut self.rng))
                    .replying_to(message.message_id);
                self.send(reply).await;
            }
            Verdict::Profanity => {
                if let Err(err) = self.api.delete(message.chat_id, message.message_id).await {
                    debug!(?err, "failed to delete flagged message");
                    return;
                }
                info!(chat_id = message.chat_id, user_id = author.id, "deleted flagged message");
                let mention = moderation::mention(author.username.as_deref(), &author.first_name);
                self.send(Outgoing::plain(message.chat_id, moderation::reprimand(&mention)))
                    .await;
            }
        }
    }

    async fn greet_new_members(&self, message: &IncomingMessage) {
        for member in message.new_members.iter().filter(|member| !member.is_bot) {
            self.send(Outgoing::plain(message.chat_id, render::welcome(&member.first_name)))
                .await;
        }
    }

    async fn handle_callback(&mut self, press: CallbackPress, today: NaiveDate) {
        if let Err(err) = self.api.answer_callback(&press.id).await {
            debug!(?err, "failed to answer callback");
        }
        let Some(action) = press.data.as_deref().and_then(MenuAction::from_callback) else {
            debug!(data = ?press.data, "ignoring unknown callback");
            return;
        };
        let (Some(chat_id), Some(message_id)) = (press.chat_id, press.message_id) else {
            return;
        };

        let views = &self.config.views;
        let text = match action {
            MenuAction::ListChildren => render::children_list(self.roster.children(), today),
            MenuAction::Tip => render::random_tip(&mut self.rng),
            MenuAction::Stats => render::statistics(self.roster.children(), today),
            MenuAction::Birthdays => {
                render::birthdays(self.roster.children(), today, views.birthday_window_days)
            }
            MenuAction::Calendar => {
                render::calendar(self.roster.events(), today, views.event_window_days)
            }
            MenuAction::Help => render::help(),
        };

        if let Err(err) = self
            .api
            .edit(chat_id, message_id, &text, TextFormat::MarkdownV2)
            .await
        {
            warn!(chat_id, ?action, ?err, "failed to update menu message");
        }
    }

    /// Send every congratulation due on `today` that has not been sent yet.
    ///
    /// Returns how many messages went out.  A failed send leaves its key out
    /// of the greeted set so a later run the same day retries it.
    pub async fn run_daily_pass(&mut self, today: NaiveDate) -> usize {
        let Some(chat_id) = self.target_chat() else {
            info!(%today, "daily pass skipped: no chat has run /start yet");
            return 0;
        };

        let due = due_greetings(self.roster.children(), today);
        let mut qualified = HashSet::with_capacity(due.len());
        let mut sent = 0;
        for greeting in due {
            if self.greeted.contains(&greeting.key) {
                qualified.insert(greeting.key);
                continue;
            }
            match self.api.send(&Outgoing::markdown(chat_id, greeting.text)).await {
                Ok(()) => {
                    info!(key = %greeting.key, "congratulation sent");
                    qualified.insert(greeting.key);
                    sent += 1;
                }
                Err(err) => warn!(key = %greeting.key, ?err, "failed to send congratulation"),
            }
        }
        self.greeted.replace_with(qualified);
        info!(%today, chat_id, sent, "daily pass finished");
        sent
    }

    async fn send(&self, message: Outgoing) {
        if let Err(err) = self.api.send(&message).await {
            warn!(chat_id = message.chat_id, ?err, "failed to send message");
        }
    }
}
