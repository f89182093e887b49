use std::{collections::HashMap, time::SystemTime};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::codes::generate_player_id;
use crate::state::state_machine::{InvalidTransition, RoomStatus, RoomTransition};

/// Human-shareable room code (fixed length, uppercase alphanumeric).
pub type RoomId = String;
/// Opaque player identifier, unique for the lifetime of the process.
pub type PlayerId = Uuid;
/// Answers of a single player keyed by stringified question id.
pub type UserAnswers = HashMap<String, String>;

/// Multiple-choice question as served by the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier unique within the question bank.
    pub id: u32,
    /// Prompt displayed to players.
    pub question: String,
    /// Ordered, pairwise distinct answer options.
    pub options: Vec<String>,
    /// Option considered correct; always one of `options`.
    pub correct_answer: String,
    /// Optional explanation revealed with the results.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    /// Whether the given answer set picks the correct option for this question.
    pub fn is_answered_by(&self, answers: &UserAnswers) -> bool {
        answers
            .get(&self.id.to_string())
            .is_some_and(|answer| *answer == self.correct_answer)
    }
}

/// Player info tracked inside a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Opaque identifier handed back to the client session.
    pub id: PlayerId,
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Whether this player may start the game.
    pub is_host: bool,
    /// Final score, set for every player at once when the room finishes.
    pub score: Option<u32>,
}

impl Player {
    /// Build a fresh player with a newly allocated identifier.
    pub fn new(name: String, is_host: bool) -> Self {
        Self {
            id: generate_player_id(),
            name,
            is_host,
            score: None,
        }
    }
}

/// Aggregated state of a multiplayer quiz room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Shareable room code.
    pub id: RoomId,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Players keyed by id, in join order.
    pub players: IndexMap<PlayerId, Player>,
    /// Questions sampled at creation; never mutated afterwards.
    pub questions: Vec<Question>,
    /// Final answer sets keyed by player id.
    pub answers: HashMap<PlayerId, UserAnswers>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Result of recording a player's answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Answers were stored.
    Recorded,
    /// The player had already submitted; nothing changed.
    AlreadySubmitted,
}

impl Room {
    /// Create a room in the waiting status with `host` as its only player.
    pub fn new(id: RoomId, mut host: Player, questions: Vec<Question>) -> Self {
        host.is_host = true;
        let mut players = IndexMap::new();
        players.insert(host.id, host);

        Self {
            id,
            status: RoomStatus::Waiting,
            players,
            questions,
            answers: HashMap::new(),
            created_at: SystemTime::now(),
        }
    }

    /// Append a non-host player at the end of the join order.
    pub fn add_player(&mut self, name: String) -> Player {
        let player = Player::new(name, false);
        self.players.insert(player.id, player.clone());
        player
    }

    /// The current host, if any player remains.
    pub fn host(&self) -> Option<&Player> {
        self.players.values().find(|player| player.is_host)
    }

    /// Whether `player_id` already has a recorded answer set.
    pub fn has_submitted(&self, player_id: &PlayerId) -> bool {
        self.answers.contains_key(player_id)
    }

    /// True when the room is non-empty and every current player has submitted.
    pub fn all_submitted(&self) -> bool {
        !self.players.is_empty() && self.players.keys().all(|id| self.has_submitted(id))
    }

    /// Apply the start transition.
    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.status = self.status.next(RoomTransition::StartGame)?;
        Ok(())
    }

    /// Store `answers` as the final answer set of `player_id`. Submissions are write-once.
    pub fn record_answers(&mut self, player_id: PlayerId, answers: UserAnswers) -> Submission {
        if self.has_submitted(&player_id) {
            return Submission::AlreadySubmitted;
        }
        self.answers.insert(player_id, answers);
        Submission::Recorded
    }

    /// Number of questions answered correctly by `answers`.
    pub fn score_answers(&self, answers: &UserAnswers) -> u32 {
        self.questions
            .iter()
            .filter(|question| question.is_answered_by(answers))
            .count() as u32
    }

    /// Score every player and move the room to finished when all players submitted.
    ///
    /// Returns `Ok(true)` when the scoring transition fired. Scores are computed for all players
    /// before any is written, so either every player gets a score or none does.
    pub fn finish_if_complete(&mut self) -> Result<bool, InvalidTransition> {
        if self.status != RoomStatus::InProgress || !self.all_submitted() {
            return Ok(false);
        }

        let next = self.status.next(RoomTransition::AllSubmitted)?;
        let scores = self
            .players
            .keys()
            .map(|id| {
                let score = self
                    .answers
                    .get(id)
                    .map(|answers| self.score_answers(answers))
                    .unwrap_or(0);
                (*id, score)
            })
            .collect::<Vec<_>>();

        for (id, score) in scores {
            if let Some(player) = self.players.get_mut(&id) {
                player.score = Some(score);
            }
        }
        self.status = next;

        Ok(true)
    }

    /// Remove a player, handing the host role to the earliest remaining joiner when needed.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Player> {
        let removed = self.players.shift_remove(player_id)?;
        self.answers.remove(player_id);

        if removed.is_host {
            if let Some((_, next_host)) = self.players.first_mut() {
                next_host.is_host = true;
            }
        }

        Some(removed)
    }

    /// Players ordered by descending score; ties keep join order.
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut ranking = self.players.values().collect::<Vec<_>>();
        ranking.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u32, correct: &str) -> Question {
        Question {
            id,
            question: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct.into(),
            explanation: None,
        }
    }

    fn answers(pairs: &[(u32, &str)]) -> UserAnswers {
        pairs
            .iter()
            .map(|(id, answer)| (id.to_string(), answer.to_string()))
            .collect()
    }

    fn room_with_guest() -> (Room, PlayerId, PlayerId) {
        let host = Player::new("Host".into(), true);
        let host_id = host.id;
        let mut room = Room::new(
            "ABCD".into(),
            host,
            vec![question(1, "a"), question(2, "b"), question(3, "c")],
        );
        let guest = room.add_player("Guest".into());
        (room, host_id, guest.id)
    }

    #[test]
    fn new_room_waits_with_host() {
        let (room, host_id, guest_id) = room_with_guest();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.host().map(|p| p.id), Some(host_id));
        assert!(!room.players[&guest_id].is_host);
        assert_eq!(room.players.keys().copied().collect::<Vec<_>>(), vec![host_id, guest_id]);
    }

    #[test]
    fn scoring_counts_matching_answers() {
        let (room, _, _) = room_with_guest();
        assert_eq!(room.score_answers(&UserAnswers::new()), 0);
        assert_eq!(room.score_answers(&answers(&[(1, "a"), (2, "a")])), 1);
        assert_eq!(
            room.score_answers(&answers(&[(1, "a"), (2, "b"), (3, "c")])),
            3
        );
        // Answers for questions outside the room are ignored.
        assert_eq!(room.score_answers(&answers(&[(42, "a")])), 0);
    }

    #[test]
    fn finish_waits_for_every_player() {
        let (mut room, host_id, guest_id) = room_with_guest();
        room.start().unwrap();

        room.record_answers(host_id, answers(&[(1, "a")]));
        assert!(!room.finish_if_complete().unwrap());
        assert!(room.players.values().all(|p| p.score.is_none()));

        room.record_answers(guest_id, answers(&[(1, "a"), (2, "b"), (3, "c")]));
        assert!(room.finish_if_complete().unwrap());
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.players[&host_id].score, Some(1));
        assert_eq!(room.players[&guest_id].score, Some(3));
    }

    #[test]
    fn finish_never_fires_twice() {
        let (mut room, host_id, guest_id) = room_with_guest();
        room.start().unwrap();
        room.record_answers(host_id, UserAnswers::new());
        room.record_answers(guest_id, UserAnswers::new());
        assert!(room.finish_if_complete().unwrap());
        assert!(!room.finish_if_complete().unwrap());
    }

    #[test]
    fn finish_requires_in_progress() {
        let (mut room, host_id, guest_id) = room_with_guest();
        room.record_answers(host_id, UserAnswers::new());
        room.record_answers(guest_id, UserAnswers::new());
        assert!(!room.finish_if_complete().unwrap());
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[test]
    fn submissions_are_write_once() {
        let (mut room, host_id, _) = room_with_guest();
        assert_eq!(
            room.record_answers(host_id, answers(&[(1, "a")])),
            Submission::Recorded
        );
        assert_eq!(
            room.record_answers(host_id, answers(&[(1, "b")])),
            Submission::AlreadySubmitted
        );
        assert_eq!(room.answers[&host_id]["1"], "a");
    }

    #[test]
    fn host_departure_promotes_earliest_joiner() {
        let (mut room, host_id, guest_id) = room_with_guest();
        let late = room.add_player("Late".into());

        let removed = room.remove_player(&host_id).unwrap();
        assert!(removed.is_host);
        assert_eq!(room.host().map(|p| p.id), Some(guest_id));
        assert!(!room.players[&late.id].is_host);
        assert_eq!(room.players.values().filter(|p| p.is_host).count(), 1);
    }

    #[test]
    fn removing_player_drops_answers() {
        let (mut room, _, guest_id) = room_with_guest();
        room.record_answers(guest_id, UserAnswers::new());
        room.remove_player(&guest_id);
        assert!(!room.has_submitted(&guest_id));
        assert!(room.remove_player(&guest_id).is_none());
    }

    #[test]
    fn leaderboard_sorts_descending_and_keeps_join_order_on_ties() {
        let (mut room, host_id, guest_id) = room_with_guest();
        let third = room.add_player("Third".into());
        room.players[&host_id].score = Some(1);
        room.players[&guest_id].score = Some(3);
        room.players[&third.id].score = Some(1);

        let order = room.leaderboard().iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(order, vec![guest_id, host_id, third.id]);
    }
}
