//! # Play Command
//!
//! Hot-seat memory matching in the terminal.
//!
//! Names are collected on stdin (blank keeps the `Player N` default, a
//! duplicate re-prompts), then players take turns typing board positions.
//! Delayed transitions are run through a [`Timeline`] right after each pair
//! is turned, so a round plays out without waiting on the wall clock.
//!
//! ## Input
//!
//! - `3` or `3 7`: flip one or two cards (1-based positions)
//! - `r` / `reset`: clear the board and collect names again
//! - `q` / `quit`: leave the game

use crate::error::CliError;
use crate::formatters::{format_board, format_outcome, format_scoreboard};
use crate::io_utils::read_stdin_line;
use crate::ui;
use crate::validation::{ParseResult, parse_play_input};
use memora_engine::game::{Controller, Effect, Event};
use memora_engine::player::{PALETTE, default_name};
use memora_engine::rules::{Difficulty, RoundSetup};
use memora_engine::scoreboard::{Scoreboard, TurnAnnouncement};
use memora_engine::timeline::Timeline;
use std::io::{BufRead, Write};

/// Resolved settings for one `play` invocation.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub players: usize,
    pub difficulty: Difficulty,
    pub seed: u64,
    /// Names supplied up front; missing seats are prompted for
    pub names: Vec<String>,
}

enum RoundExit {
    Reset,
    Quit,
}

/// Handle the play command: interactive rounds until the player quits or
/// input runs out.
///
/// # Errors
///
/// I/O failures on any of the streams.
pub fn handle_play_command(
    opts: PlayOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
    stdin: &mut dyn BufRead,
) -> Result<(), CliError> {
    let setup = RoundSetup::new(opts.players, opts.difficulty);
    writeln!(
        out,
        "play: players={} difficulty={} seed={}",
        setup.players, setup.difficulty, opts.seed
    )?;
    if setup.players > PALETTE.len() {
        ui::display_warning(
            err,
            &format!(
                "{} players share {} colors; some colors will repeat.",
                setup.players,
                PALETTE.len()
            ),
        )?;
    }

    let mut table = Table::new(opts.seed, setup);
    let mut preset = Some(opts.names);
    loop {
        match table.play_round(&mut preset, stdin, out, err)? {
            RoundExit::Reset => continue,
            RoundExit::Quit => break,
        }
    }
    writeln!(out, "Goodbye.")?;
    Ok(())
}

/// Controller plus the pieces a terminal needs around it.
struct Table {
    controller: Controller,
    timeline: Timeline,
    scoreboard: Scoreboard,
    setup: RoundSetup,
}

impl Table {
    fn new(seed: u64, setup: RoundSetup) -> Self {
        Self {
            controller: Controller::new(seed),
            timeline: Timeline::new(),
            scoreboard: Scoreboard::new(),
            setup,
        }
    }

    fn play_round(
        &mut self,
        preset: &mut Option<Vec<String>>,
        stdin: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<RoundExit, CliError> {
        let mut effects = self.controller.dispatch(Event::Start(self.setup));
        if let Some(Effect::NamesRequired { count }) = effects.first() {
            let count = *count;
            match self.collect_names(count, preset.take(), stdin, out, err)? {
                Some(started) => effects = started,
                None => return Ok(RoundExit::Quit),
            }
        }
        self.render(&effects, out)?;
        self.show_board(out)?;

        loop {
            let Some(session) = self.controller.session() else {
                return Ok(RoundExit::Reset);
            };
            let card_count = session.cards().len();
            let complete = session.is_complete();

            if complete {
                ui::prompt(out, "Enter r to play again or q to quit: ")?;
            } else {
                ui::prompt(
                    out,
                    &format!("Pick a card (1-{}), r to reset, q to quit: ", card_count),
                )?;
            }
            let Some(line) = read_stdin_line(stdin)? else {
                writeln!(out)?;
                return Ok(RoundExit::Quit);
            };

            match parse_play_input(&line, card_count) {
                ParseResult::Quit => return Ok(RoundExit::Quit),
                ParseResult::Reset => {
                    let effects = self.controller.dispatch(Event::Reset);
                    self.timeline.clear();
                    self.render(&effects, out)?;
                    return Ok(RoundExit::Reset);
                }
                ParseResult::Invalid(msg) => ui::write_error(err, &msg)?,
                ParseResult::Flip(_) if complete => {
                    ui::write_error(err, "The round is over")?;
                }
                ParseResult::Flip(positions) => {
                    for position in positions {
                        self.flip(position, out, err)?;
                    }
                }
            }
        }
    }

    /// Prompts until a unique set of names is accepted. `None` means input ran out.
    fn collect_names(
        &mut self,
        count: usize,
        preset: Option<Vec<String>>,
        stdin: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Option<Vec<Effect>>, CliError> {
        let mut preset = preset.filter(|names| !names.is_empty());
        loop {
            let mut names = preset.take().unwrap_or_default();
            names.truncate(count);
            for seat in names.len()..count {
                ui::prompt(
                    out,
                    &format!(
                        "Name for player {} (blank for {}): ",
                        seat + 1,
                        default_name(seat)
                    ),
                )?;
                match read_stdin_line(stdin)? {
                    Some(name) => names.push(name),
                    None => {
                        writeln!(out)?;
                        return Ok(None);
                    }
                }
            }

            let effects = self.controller.dispatch(Event::SubmitNames(names));
            match effects.first() {
                Some(Effect::NamesRejected { message, .. }) => ui::write_error(err, message)?,
                _ => return Ok(Some(effects)),
            }
        }
    }

    fn flip(
        &mut self,
        position: usize,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<(), CliError> {
        let effects = self
            .timeline
            .absorb(self.controller.dispatch(Event::Click(position)));
        if effects.is_empty() {
            ui::write_error(err, &format!("Card {} cannot be flipped now", position + 1))?;
            return Ok(());
        }
        self.render(&effects, out)?;

        if self.timeline.pending() > 0 {
            self.show_board(out)?;
            let controller = &mut self.controller;
            let later = self
                .timeline
                .drain(|timer| controller.dispatch(Event::Timer(timer)));
            self.render(&later, out)?;
            self.show_board(out)?;
        }
        Ok(())
    }

    fn render(&mut self, effects: &[Effect], out: &mut dyn Write) -> Result<(), CliError> {
        for effect in effects {
            match effect {
                Effect::RoundStarted {
                    difficulty,
                    card_count,
                    ..
                } => {
                    let (cols, rows) = difficulty.grid();
                    writeln!(
                        out,
                        "Round started: {} {}x{}, {} pairs",
                        difficulty,
                        cols,
                        rows,
                        card_count / 2
                    )?;
                }
                Effect::CardFlipped { position, value } => {
                    writeln!(out, "Card {}: {}", position + 1, value)?;
                }
                Effect::ScoreChanged { player, score } => {
                    let name = self.player_name(*player);
                    writeln!(out, "Match! {} has {} pairs", name, score)?;
                }
                Effect::CardsHidden { .. } => writeln!(out, "No match.")?,
                Effect::TurnAnnounced { player } => {
                    if let Some(turn) = self
                        .controller
                        .session()
                        .and_then(|s| TurnAnnouncement::for_player(s, *player))
                    {
                        writeln!(out, "-- {} --", turn.text())?;
                    }
                }
                Effect::RoundComplete { outcome } => {
                    for line in format_outcome(outcome) {
                        writeln!(out, "{}", line)?;
                    }
                }
                Effect::BoardCleared => {
                    self.scoreboard.clear();
                    writeln!(out, "Board cleared.")?;
                }
                Effect::NamesRequired { .. }
                | Effect::NamesRejected { .. }
                | Effect::CardsMatched { .. }
                | Effect::CardsVacated { .. }
                | Effect::TurnChanged { .. }
                | Effect::Schedule { .. } => {}
            }
        }
        Ok(())
    }

    fn show_board(&mut self, out: &mut dyn Write) -> Result<(), CliError> {
        let Some(session) = self.controller.session() else {
            return Ok(());
        };
        self.scoreboard.sync(session);
        writeln!(out)?;
        writeln!(out, "{}", format_board(session.cards(), session.difficulty()))?;
        for line in format_scoreboard(&self.scoreboard) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn player_name(&self, player: usize) -> String {
        self.controller
            .session()
            .and_then(|s| s.players().get(player))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| default_name(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memora_engine::deck::Deck;
    use std::io::Cursor;

    fn options(names: &[&str]) -> PlayOptions {
        PlayOptions {
            players: 2,
            difficulty: Difficulty::Easy,
            seed: 42,
            names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn run(opts: PlayOptions, input: &str) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut stdin = Cursor::new(input.as_bytes());
        handle_play_command(opts, &mut out, &mut err, &mut stdin).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    /// 1-based position pairs for the first board dealt from `seed`.
    fn pairs(seed: u64) -> Vec<(usize, usize)> {
        let cards = Deck::new_with_seed(seed).deal(Difficulty::Easy);
        let mut out = Vec::new();
        for (i, a) in cards.iter().enumerate() {
            if let Some(j) = cards.iter().skip(i + 1).position(|b| b.value == a.value) {
                out.push((i + 1, i + j + 2));
            }
        }
        out
    }

    #[test]
    fn test_header_and_quit() {
        let (out, _) = run(options(&["ann", "ben"]), "q\n");
        assert!(out.starts_with("play: players=2 difficulty=easy seed=42"));
        assert!(out.contains("Round started: easy 4x4, 8 pairs"));
        assert!(out.contains("-- Ann's turn --"));
        assert!(out.trim_end().ends_with("Goodbye."));
    }

    #[test]
    fn test_prompts_for_missing_names() {
        let (out, _) = run(options(&["ann"]), "\nq\n");
        assert!(out.contains("Name for player 2 (blank for Player 2): "));
        assert!(out.contains("Player 2"));
    }

    #[test]
    fn test_duplicate_names_reprompt() {
        let (out, err) = run(options(&[]), "Ann\nann\nAnn\nBen\nq\n");
        assert!(err.contains("Please enter unique player names. Duplicate: ann"));
        assert!(out.contains("-- Ann's turn --"));
    }

    #[test]
    fn test_full_round_announces_winner() {
        let mut input: String = pairs(42)
            .iter()
            .map(|(a, b)| format!("{} {}\n", a, b))
            .collect();
        input.push_str("q\n");
        let (out, _) = run(options(&["ann", "ben"]), &input);
        assert!(out.contains("Match! Ann has 8 pairs"));
        assert!(out.contains("Ann wins!"));
        assert!(out.contains("  Ann: 8 pairs"));
        assert!(out.contains("  Ben: 0 pairs"));
    }

    #[test]
    fn test_mismatch_passes_turn() {
        let cards = Deck::new_with_seed(42).deal(Difficulty::Easy);
        let other = cards
            .iter()
            .position(|c| c.value != cards[0].value)
            .unwrap();
        let (out, _) = run(options(&["ann", "ben"]), &format!("1 {}\nq\n", other + 1));
        assert!(out.contains("No match."));
        assert!(out.contains("-- Ben's turn --"));
    }

    #[test]
    fn test_invalid_input_and_unavailable_card() {
        let (_, err) = run(options(&["ann", "ben"]), "99\nhello\n1\n1\nq\n");
        assert!(err.contains("Position 99 is out of range (1-16)"));
        assert!(err.contains("Unrecognized input: hello"));
        assert!(err.contains("Card 1 cannot be flipped now"));
    }

    #[test]
    fn test_reset_collects_names_again() {
        let (out, _) = run(options(&["ann", "ben"]), "r\ncy\ndee\nq\n");
        assert!(out.contains("Board cleared."));
        assert!(out.contains("-- Cy's turn --"));
    }

    #[test]
    fn test_end_of_input_quits_cleanly() {
        let (out, _) = run(options(&[]), "Ann\n");
        assert!(out.contains("Goodbye."));
        assert!(!out.contains("Round started"));
    }

    #[test]
    fn test_many_players_warns_about_colors() {
        let opts = PlayOptions {
            players: 11,
            ..options(&[])
        };
        let (_, err) = run(opts, "");
        assert!(err.contains("WARNING: 11 players share 10 colors"));
    }
}
