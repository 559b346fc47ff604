//! Bot Module
//!
//! Novelty commands answered by the server itself: `TIME` reports the local
//! wall-clock time and `RPS` plays one round of rock-paper-scissors.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use relayircd_core::{frame, Client, Message, Module, ModuleContext, NumericReply, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A rock-paper-scissors move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Whether this move defeats `other`
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
        )
    }
}

impl FromStr for Move {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Result of a round from the player's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

impl Outcome {
    pub fn decide(player: Move, bot: Move) -> Self {
        if player == bot {
            Outcome::Tie
        } else if player.beats(bot) {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Outcome::Win => "You win!",
            Outcome::Lose => "Bot wins!",
            Outcome::Tie => "It's a tie!",
        }
    }
}

/// Server-side bot answering TIME and RPS
pub struct BotModule {
    /// Seeded once; every round draws from the same generator
    rng: SmallRng,
}

impl BotModule {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic bot, for reproducible games
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn line(ctx: &ModuleContext<'_>, nick: &str, text: &str) -> String {
        frame(&format!(":{} BOT {} :{}", ctx.server_name, nick, text))
    }

    fn handle_time(&self, nick: &str, ctx: &ModuleContext<'_>) -> Vec<String> {
        let now = chrono::Local::now().format("%H:%M:%S");
        vec![Self::line(ctx, nick, &format!("Current time is: {}", now))]
    }

    fn handle_rps(&mut self, nick: &str, message: &Message, ctx: &ModuleContext<'_>) -> Vec<String> {
        let Some(raw) = message.param(0) else {
            return vec![Self::line(ctx, nick, "Usage: RPS <rock|paper|scissors>")];
        };
        let Ok(player) = raw.parse::<Move>() else {
            return vec![Self::line(
                ctx,
                nick,
                "Invalid move! Use: rock, paper, or scissors",
            )];
        };

        let bot = Move::ALL[self.rng.gen_range(0..Move::ALL.len())];
        let outcome = Outcome::decide(player, bot);
        debug!("RPS {}: {} vs {} -> {:?}", nick, player, bot, outcome);

        vec![
            Self::line(ctx, nick, "ROCK PAPER SCISSORS"),
            Self::line(ctx, nick, &format!("Your move: {}", player)),
            Self::line(ctx, nick, &format!("Bot's move: {}", bot)),
            Self::line(ctx, nick, &format!("Result: {}", outcome.describe())),
        ]
    }
}

impl Default for BotModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for BotModule {
    fn name(&self) -> &str {
        "bot"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn commands(&self) -> &[&'static str] {
        &["TIME", "RPS"]
    }

    fn handle_command(
        &mut self,
        client: &Client,
        message: &Message,
        ctx: &ModuleContext<'_>,
    ) -> Result<Vec<String>> {
        let nick = client.nick_or_star();
        if !client.is_registered() {
            return Ok(vec![NumericReply::not_registered(ctx.server_name, nick)]);
        }

        let lines = match message.command.as_str() {
            "TIME" => self.handle_time(nick, ctx),
            "RPS" => self.handle_rps(nick, message, ctx),
            _ => vec![NumericReply::unknown_command(ctx.server_name, nick, &message.command)],
        };
        Ok(lines)
    }
}
