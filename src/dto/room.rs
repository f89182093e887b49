//! Request and response payloads for the room command surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::RoomRecord,
    dto::format_system_time,
    state::{
        room::{Player, Question, Room},
        state_machine::RoomStatus,
    },
};

/// Payload used by a host to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    #[validate(custom(function = "crate::dto::validation::validate_player_name"))]
    pub player_name: String,
    /// Number of questions to draw from the question bank.
    pub question_count: usize,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    #[validate(custom(function = "crate::dto::validation::validate_player_name"))]
    pub player_name: String,
}

/// Payload identifying the caller of a host-only action.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGameRequest {
    pub player_id: Uuid,
}

/// Final answer set of a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswersRequest {
    pub player_id: Uuid,
    /// Selected option keyed by question id. Unanswered questions may be omitted.
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

/// Returned by create and join: the room as seen right after the command, and the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomJoinedResponse {
    pub room: RoomSnapshot,
    pub player: PlayerSummary,
}

/// Acknowledgement of an answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswersResponse {
    /// False when the player had already submitted or the room was already finished.
    pub accepted: bool,
    pub status: RoomStatus,
}

/// Generic action acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Size of the question bank, so clients can offer valid question counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionStatsResponse {
    pub total: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a player exposed to REST/SSE clients.
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// Question as shown to players; the solution is only present once the room is finished.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QuestionView {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Answers a player submitted, revealed with the results.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerAnswers {
    pub player_id: Uuid,
    pub answers: HashMap<String, String>,
}

/// One line of the final ranking.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position; tied scores share a rank.
    pub rank: usize,
    pub player_id: Uuid,
    pub name: String,
    pub score: u32,
}

/// Final ranking of a finished room.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub room_id: String,
    pub total_questions: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Full state of a room pushed to subscribers and returned by polling.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoomSnapshot {
    pub id: String,
    pub status: RoomStatus,
    /// Increases with every committed change; stale snapshots can be discarded.
    pub version: u64,
    pub created_at: String,
    /// Players in join order.
    pub players: Vec<PlayerSummary>,
    pub questions: Vec<QuestionView>,
    /// Players whose answers are in.
    pub submitted: Vec<Uuid>,
    /// Present once finished: every player's answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<PlayerAnswers>>,
    /// Present once finished: players sorted by descending score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_host: player.is_host,
            score: player.score,
        }
    }
}

impl QuestionView {
    fn from_question(question: &Question, reveal: bool) -> Self {
        Self {
            id: question.id,
            question: question.question.clone(),
            options: question.options.clone(),
            correct_answer: reveal.then(|| question.correct_answer.clone()),
            explanation: if reveal {
                question.explanation.clone()
            } else {
                None
            },
        }
    }
}

/// Rank players by descending score, giving equal scores the same rank.
pub fn leaderboard_entries(room: &Room) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(room.players.len());
    for (index, player) in room.leaderboard().into_iter().enumerate() {
        let score = player.score.unwrap_or(0);
        let rank = match entries.last() {
            Some(previous) if previous.score == score => previous.rank,
            _ => index + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            player_id: player.id,
            name: player.name.clone(),
            score,
        });
    }
    entries
}

impl From<&RoomRecord> for RoomSnapshot {
    fn from(record: &RoomRecord) -> Self {
        let room = &record.room;
        let finished = room.status == RoomStatus::Finished;

        let answers = finished.then(|| {
            room.players
                .keys()
                .filter_map(|id| {
                    room.answers.get(id).map(|answers| PlayerAnswers {
                        player_id: *id,
                        answers: answers.clone(),
                    })
                })
                .collect()
        });

        Self {
            id: room.id.clone(),
            status: room.status,
            version: record.version,
            created_at: format_system_time(room.created_at),
            players: room.players.values().map(PlayerSummary::from).collect(),
            questions: room
                .questions
                .iter()
                .map(|question| QuestionView::from_question(question, finished))
                .collect(),
            submitted: room
                .players
                .keys()
                .filter(|id| room.has_submitted(id))
                .copied()
                .collect(),
            answers,
            leaderboard: finished.then(|| leaderboard_entries(room)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::UserAnswers;

    fn question(id: u32) -> Question {
        Question {
            id,
            question: format!("Q{id}"),
            options: vec!["yes".into(), "no".into()],
            correct_answer: "yes".into(),
            explanation: Some("because".into()),
        }
    }

    fn finished_room() -> Room {
        let mut room = Room::new(
            "ABCD".into(),
            Player::new("Host".into(), true),
            vec![question(1), question(2)],
        );
        let guest = room.add_player("Guest".into());
        let host_id = *room.players.keys().next().unwrap();
        room.start().unwrap();
        room.record_answers(host_id, UserAnswers::new());
        room.record_answers(
            guest.id,
            [("1".to_string(), "yes".to_string())].into_iter().collect(),
        );
        room.finish_if_complete().unwrap();
        room
    }

    #[test]
    fn solutions_hidden_until_finished() {
        let room = Room::new("ABCD".into(), Player::new("Host".into(), true), vec![question(1)]);
        let snapshot = RoomSnapshot::from(&RoomRecord { room, version: 1 });
        assert!(snapshot.questions[0].correct_answer.is_none());
        assert!(snapshot.questions[0].explanation.is_none());
        assert!(snapshot.answers.is_none());
        assert!(snapshot.leaderboard.is_none());
    }

    #[test]
    fn finished_snapshot_reveals_results() {
        let snapshot = RoomSnapshot::from(&RoomRecord {
            room: finished_room(),
            version: 7,
        });
        assert_eq!(snapshot.version, 7);
        assert_eq!(snapshot.questions[0].correct_answer.as_deref(), Some("yes"));
        assert_eq!(snapshot.submitted.len(), 2);
        assert_eq!(snapshot.answers.as_ref().map(Vec::len), Some(2));

        let leaderboard = snapshot.leaderboard.unwrap();
        assert_eq!(leaderboard[0].name, "Guest");
        assert_eq!(leaderboard[0].score, 1);
        assert_eq!(leaderboard[1].rank, 2);
    }

    #[test]
    fn tied_scores_share_rank() {
        let mut room = finished_room();
        for player in room.players.values_mut() {
            player.score = Some(2);
        }
        let entries = leaderboard_entries(&room);
        assert!(entries.iter().all(|entry| entry.rank == 1));
    }
}
