// Action dispatch: normalized keyword requests in, rendered responses out.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::engine::growth::Direction;
use crate::engine::{DuelVerdict, GameEngine, GrowOutcome, LeaderboardPage, PAGE_SIZE};
use crate::error::GameError;
use crate::metrics;
use crate::texts;

/// Everything the transport gateway tells us about one user action.
/// Group chats arrive with negative scope ids (platform convention);
/// private chats are positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub scope_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub locale: String,
    pub action_kind: String,
    #[serde(default)]
    pub free_text_args: String,
}

/// Where a response goes: back to the requesting chat, or to the
/// operator channel for invariant reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseTarget {
    Chat { chat_id: i64 },
    Operator { chat_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

/// Inline keyboard markup: rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub target: ResponseTarget,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

/// The supported action keywords, as one closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Grow,
    My,
    Name,
    Top,
    TopPage,
    Pig,
    Duel,
    GlobalTop,
    WinsTop,
    Help,
}

impl ActionKind {
    pub fn from_keyword(s: &str) -> Option<ActionKind> {
        match s {
            "grow" => Some(ActionKind::Grow),
            "my" => Some(ActionKind::My),
            "name" => Some(ActionKind::Name),
            "top" => Some(ActionKind::Top),
            "top_page" => Some(ActionKind::TopPage),
            "pig" => Some(ActionKind::Pig),
            "duel" => Some(ActionKind::Duel),
            "global_top" => Some(ActionKind::GlobalTop),
            "wins_top" => Some(ActionKind::WinsTop),
            "help" => Some(ActionKind::Help),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Grow => "grow",
            ActionKind::My => "my",
            ActionKind::Name => "name",
            ActionKind::Top => "top",
            ActionKind::TopPage => "top_page",
            ActionKind::Pig => "pig",
            ActionKind::Duel => "duel",
            ActionKind::GlobalTop => "global_top",
            ActionKind::WinsTop => "wins_top",
            ActionKind::Help => "help",
        }
    }

    /// Chat-scoped game actions only make sense in group chats.
    fn group_only(&self) -> bool {
        matches!(
            self,
            ActionKind::Grow
                | ActionKind::My
                | ActionKind::Name
                | ActionKind::Top
                | ActionKind::TopPage
        )
    }
}

/// Build a callback payload for a keyboard button. All request-scoped
/// state (page offsets, duel targets) travels inside the payload.
pub fn encode_callback(kind: ActionKind, arg: &str) -> String {
    format!("{}:{}", kind.as_str(), arg)
}

/// Parse a callback payload back into (kind, argument). A payload with
/// no `:` separator decodes with an empty argument.
pub fn decode_callback(payload: &str) -> Option<(ActionKind, String)> {
    let (keyword, arg) = match payload.split_once(':') {
        Some((k, a)) => (k, a),
        None => (payload, ""),
    };
    ActionKind::from_keyword(keyword).map(|kind| (kind, arg.to_string()))
}

/// Routes Action Requests onto engine operations and renders the replies.
pub struct Dispatcher {
    engine: Arc<GameEngine>,
    operator_chat_id: Option<i64>,
}

impl Dispatcher {
    pub fn new(engine: Arc<GameEngine>, operator_chat_id: Option<i64>) -> Self {
        Self {
            engine,
            operator_chat_id,
        }
    }

    /// Handle one action end to end. Never fails: errors render as
    /// responses, faults additionally notify the operator channel.
    pub async fn handle(&self, req: ActionRequest) -> Vec<ActionResponse> {
        let Some(kind) = ActionKind::from_keyword(&req.action_kind) else {
            debug!(keyword = %req.action_kind, user_id = req.user_id, "unknown action keyword");
            return vec![reply(&req, texts::unknown_action_message().to_string())];
        };

        metrics::ACTIONS_TOTAL.with_label_values(&[kind.as_str()]).inc();
        info!(
            kind = kind.as_str(),
            scope_id = req.scope_id,
            user_id = req.user_id,
            locale = %req.locale,
            "handling action"
        );

        if kind.group_only() && req.scope_id >= 0 {
            return vec![reply(&req, texts::group_only_message().to_string())];
        }

        metrics::INFLIGHT_ACTIONS.inc();
        let result = self.run(kind, &req).await;
        metrics::INFLIGHT_ACTIONS.dec();

        match result {
            Ok(responses) => responses,
            Err(err) => self.render_error(&req, err),
        }
    }

    async fn run(
        &self,
        kind: ActionKind,
        req: &ActionRequest,
    ) -> Result<Vec<ActionResponse>, GameError> {
        let now = Utc::now();
        let responses = match kind {
            ActionKind::Grow => {
                let outcome = self
                    .engine
                    .grow_pig(req.scope_id, req.user_id, &req.display_name, now)
                    .await?;
                match outcome {
                    GrowOutcome::Grown {
                        record,
                        reported,
                        direction,
                    } => {
                        let text = match direction {
                            Direction::Gained => texts::grow_gained_message(&record, reported),
                            Direction::Lost => texts::grow_lost_message(&record, reported),
                        };
                        vec![reply(req, text)]
                    }
                    GrowOutcome::AlreadyGrown { hours, minutes } => {
                        vec![reply(req, texts::already_grown_message(hours, minutes))]
                    }
                }
            }
            ActionKind::My => {
                let record = self.engine.my_pig(req.scope_id, req.user_id).await?;
                vec![reply(req, texts::my_pig_message(&record))]
            }
            ActionKind::Name => {
                if req.free_text_args.trim().is_empty() {
                    let record = self.engine.my_pig(req.scope_id, req.user_id).await?;
                    return Ok(vec![reply(req, texts::name_current_message(&record))]);
                }
                let name = texts::sanitize_name(&req.free_text_args);
                if name.is_empty() {
                    return Ok(vec![reply(req, texts::name_unusable_message().to_string())]);
                }
                let record = self
                    .engine
                    .set_name(req.scope_id, req.user_id, &name)
                    .await?;
                vec![reply(req, texts::name_set_message(&record))]
            }
            ActionKind::Top => {
                let page = self.engine.chat_top(req.scope_id, 0).await?;
                vec![page_reply(req, &page)]
            }
            ActionKind::TopPage => {
                let offset = req.free_text_args.trim().parse::<i64>().unwrap_or(0).max(0);
                let page = self.engine.chat_top(req.scope_id, offset).await?;
                vec![page_reply(req, &page)]
            }
            ActionKind::Pig => {
                let record = self
                    .engine
                    .pig_card(req.user_id, &req.display_name, now)
                    .await?;
                let keyboard = Keyboard {
                    rows: vec![vec![Button {
                        label: "Fight this pig".to_string(),
                        callback_data: encode_callback(
                            ActionKind::Duel,
                            &record.user_id.to_string(),
                        ),
                    }]],
                };
                vec![ActionResponse {
                    target: ResponseTarget::Chat {
                        chat_id: req.scope_id,
                    },
                    text: texts::pig_card_message(&record),
                    keyboard: Some(keyboard),
                }]
            }
            ActionKind::Duel => {
                let Ok(defender) = req.free_text_args.trim().parse::<i64>() else {
                    return Ok(vec![reply(
                        req,
                        texts::duel_needs_target_message().to_string(),
                    )]);
                };
                if defender == req.user_id {
                    return Ok(vec![reply(req, texts::self_duel_message().to_string())]);
                }
                let verdict = self
                    .engine
                    .resolve_duel(req.user_id, &req.display_name, defender, "", now)
                    .await?;
                let text = match &verdict {
                    DuelVerdict::Win {
                        winner,
                        loser,
                        tier,
                        damage,
                    } => texts::duel_win_message(winner, loser, *tier, *damage),
                    DuelVerdict::Draw {
                        first,
                        second,
                        amount,
                    } => texts::duel_draw_message(first, second, *amount),
                };
                vec![reply(req, text)]
            }
            ActionKind::GlobalTop => {
                let rows = self.engine.global_top_today(now).await?;
                vec![reply(req, texts::global_top_message(&rows))]
            }
            ActionKind::WinsTop => {
                let rows = self.engine.wins_top().await?;
                vec![reply(req, texts::wins_top_message(&rows))]
            }
            ActionKind::Help => vec![reply(req, texts::help_message().to_string())],
        };
        Ok(responses)
    }

    /// Render a game error as user-facing responses. Invariant breaks
    /// additionally notify the operator channel when one is configured.
    fn render_error(&self, req: &ActionRequest, err: GameError) -> Vec<ActionResponse> {
        metrics::GAME_ERRORS_TOTAL
            .with_label_values(&[err.class()])
            .inc();
        match &err {
            GameError::NoRecordFound => vec![reply(req, texts::no_pig_message().to_string())],
            GameError::NoOpponentRecord => {
                vec![reply(req, texts::no_opponent_message().to_string())]
            }
            GameError::Invariant(msg) => {
                error!(
                    user_id = req.user_id,
                    scope_id = req.scope_id,
                    %msg,
                    "invariant violation"
                );
                let mut out = vec![reply(req, texts::failure_message().to_string())];
                if let Some(chat_id) = self.operator_chat_id {
                    out.push(ActionResponse {
                        target: ResponseTarget::Operator { chat_id },
                        text: format!(
                            "Invariant violation handling {} for user {}: {}",
                            req.action_kind, req.user_id, msg
                        ),
                        keyboard: None,
                    });
                }
                out
            }
            _ => {
                error!(
                    user_id = req.user_id,
                    scope_id = req.scope_id,
                    error = %err,
                    "action failed"
                );
                vec![reply(req, texts::failure_message().to_string())]
            }
        }
    }
}

fn reply(req: &ActionRequest, text: String) -> ActionResponse {
    ActionResponse {
        target: ResponseTarget::Chat {
            chat_id: req.scope_id,
        },
        text,
        keyboard: None,
    }
}

fn page_reply(req: &ActionRequest, page: &LeaderboardPage) -> ActionResponse {
    ActionResponse {
        target: ResponseTarget::Chat {
            chat_id: req.scope_id,
        },
        text: texts::chat_top_message(page),
        keyboard: top_keyboard(page),
    }
}

/// Prev/next paging buttons; offsets ride in the callback payloads.
fn top_keyboard(page: &LeaderboardPage) -> Option<Keyboard> {
    let mut row = Vec::new();
    if page.has_prev() {
        let prev = (page.offset - PAGE_SIZE).max(0);
        row.push(Button {
            label: "< Prev".to_string(),
            callback_data: encode_callback(ActionKind::TopPage, &prev.to_string()),
        });
    }
    if page.has_next() {
        let next = page.offset + PAGE_SIZE;
        row.push(Button {
            label: "Next >".to_string(),
            callback_data: encode_callback(ActionKind::TopPage, &next.to_string()),
        });
    }
    if row.is_empty() {
        None
    } else {
        Some(Keyboard { rows: vec![row] })
    }
}
