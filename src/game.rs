use serde::Serialize;

use crate::matrix::{collide, merge, rotate, Matrix, Piece, Position, FIELD_WIDTH};
use crate::pieces::{PieceKind, PieceProvider, RandomPieceProvider};
use crate::scoring::Progress;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum GameStatus {
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Discrete requests from the input side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateClockwise,
    HardDrop,
    TogglePause,
    Start,
    Restart,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted,
    GameReset,
    PieceSpawned { kind: PieceKind },
    PieceMoved,
    PieceRotated,
    HardDropped { rows: u32 },
    PieceLocked,
    LinesCleared { rows: u32, score_delta: u64 },
    LevelUp { level: u32 },
    Paused,
    Unpaused,
    GameOver { score: u64 },
}

/// Read-only view of everything a renderer needs.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Snapshot {
    pub field: Matrix,
    pub active: Option<Piece>,
    pub next: Option<Matrix>,
    pub status: GameStatus,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u64,
    pub paused: bool,
    pub game_over: bool,
}

// ============================================================================
// Game
// ============================================================================

/// Events accumulate until `take_events` drains them; callers driving the
/// game should drain every frame.
pub struct Game {
    field: Matrix,
    active: Option<Piece>,
    next: Option<Matrix>,
    progress: Progress,
    status: GameStatus,
    drop_counter_ms: u64,
    last_frame_ms: Option<u64>,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    /// A game in the `Idle` state drawing pieces from `provider`.
    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        Self {
            field: Matrix::field(),
            active: None,
            next: None,
            progress: Progress::new(),
            status: GameStatus::Idle,
            drop_counter_ms: 0,
            last_frame_ms: None,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    /// A running game over a prepared field with `active` already placed.
    pub fn with_field(field: Matrix, active: Piece, mut provider: Box<dyn PieceProvider>) -> Self {
        let next = provider.next_piece().shape();
        Self {
            field,
            active: Some(active),
            next: Some(next),
            progress: Progress::new(),
            status: GameStatus::Running,
            drop_counter_ms: 0,
            last_frame_ms: None,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Leaves `Idle`: spawns the first piece and starts the drop timer.
    pub fn start(&mut self) {
        if self.status != GameStatus::Idle {
            return;
        }

        self.events.push(GameEvent::GameStarted);
        self.next = Some(self.piece_provider.next_piece().shape());
        self.drop_counter_ms = 0;
        self.last_frame_ms = None;
        self.reset_active_piece();

        if self.status == GameStatus::Idle {
            self.status = GameStatus::Running;
        }
    }

    /// Clears the field and progress and returns to `Idle`.
    pub fn reset(&mut self) {
        self.field.clear();
        self.progress = Progress::new();
        self.active = None;
        self.next = None;
        self.status = GameStatus::Idle;
        self.drop_counter_ms = 0;
        self.last_frame_ms = None;
        self.events.push(GameEvent::GameReset);
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    pub fn toggle_pause(&mut self) {
        match self.status {
            GameStatus::Running => {
                self.status = GameStatus::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameStatus::Paused => {
                self.status = GameStatus::Running;
                // Time spent paused must not count toward the next drop.
                self.last_frame_ms = None;
                self.events.push(GameEvent::Unpaused);
            }
            GameStatus::Idle | GameStatus::GameOver => {}
        }
    }

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::TogglePause => self.toggle_pause(),
            Intent::Start => self.start(),
            Intent::Restart => self.restart(),
            _ if self.status != GameStatus::Running => {}
            Intent::MoveLeft => {
                self.move_horizontal(-1);
            }
            Intent::MoveRight => {
                self.move_horizontal(1);
            }
            Intent::RotateClockwise => {
                self.rotate(1);
            }
            Intent::SoftDrop => self.soft_drop(),
            Intent::HardDrop => self.hard_drop(),
        }
    }

    // ------------------------------------------------------------------------
    // Timing
    // ------------------------------------------------------------------------

    /// Accumulates `elapsed_ms` and drops the piece once the drop interval is
    /// exceeded. Does nothing unless running.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if self.status != GameStatus::Running {
            return;
        }

        self.drop_counter_ms += elapsed_ms;
        if self.drop_counter_ms > self.progress.drop_interval_ms {
            self.soft_drop();
        }
    }

    /// Frame-timestamp variant of [`Game::tick`].
    ///
    /// The first frame after start or unpause only sets the baseline.
    pub fn advance_to(&mut self, now_ms: u64) {
        if self.status != GameStatus::Running {
            return;
        }

        let elapsed = self
            .last_frame_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_frame_ms = Some(now_ms);
        self.tick(elapsed);
    }

    // ------------------------------------------------------------------------
    // Piece control
    // ------------------------------------------------------------------------

    /// Shifts the active piece one column; returns false when blocked.
    pub fn move_horizontal(&mut self, dir: i8) -> bool {
        if self.status != GameStatus::Running {
            return false;
        }
        let moved = self.shift(dir as i16, 0);
        if moved {
            self.events.push(GameEvent::PieceMoved);
        }
        moved
    }

    /// Rotates the active piece, searching sideways for room when the rotated
    /// shape collides.
    ///
    /// Offsets tried in turn are +1, -2, +3, -4, ... applied cumulatively. The
    /// search gives up once the next offset would exceed the shape width, and
    /// the piece is left exactly as it was.
    pub fn rotate(&mut self, dir: i8) -> bool {
        if self.status != GameStatus::Running {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };

        let original_shape = piece.shape.clone();
        let original_x = piece.position.x;
        piece.shape = rotate(&piece.shape, dir);

        let mut offset: i16 = 1;
        while collide(&self.field, piece) {
            piece.position.x += offset;
            offset = -(offset + offset.signum());
            if offset > piece.shape.width() as i16 {
                piece.shape = original_shape;
                piece.position.x = original_x;
                return false;
            }
        }

        self.events.push(GameEvent::PieceRotated);
        true
    }

    /// Moves down one row, locking the piece if it cannot.
    pub fn soft_drop(&mut self) {
        if self.status != GameStatus::Running {
            return;
        }

        if self.shift(0, 1) {
            self.events.push(GameEvent::PieceMoved);
        } else {
            self.lock();
        }
        self.drop_counter_ms = 0;
    }

    /// Drops straight to the lowest free row and locks.
    pub fn hard_drop(&mut self) {
        if self.status != GameStatus::Running {
            return;
        }
        let Some(piece) = self.active.as_mut() else {
            return;
        };

        let mut rows: u32 = 0;
        while !collide(&self.field, piece) {
            piece.position.y += 1;
            rows += 1;
        }
        piece.position.y -= 1;

        self.events.push(GameEvent::HardDropped {
            rows: rows.saturating_sub(1),
        });
        self.lock();
        self.drop_counter_ms = 0;
    }

    /// Promotes the next piece to active at the spawn point and draws a new
    /// next piece. Ends the game if the spawn point is blocked.
    pub fn reset_active_piece(&mut self) {
        let shape = match self.next.take() {
            Some(shape) => shape,
            None => self.piece_provider.next_piece().shape(),
        };
        self.next = Some(self.piece_provider.next_piece().shape());

        let x = (FIELD_WIDTH / 2) as i16 - (shape.width() / 2) as i16;
        let piece = Piece::new(shape, Position::new(x, 0));
        let blocked = collide(&self.field, &piece);

        if let Some(kind) = PieceKind::of_shape(&piece.shape) {
            self.events.push(GameEvent::PieceSpawned { kind });
        }
        self.active = Some(piece);

        if blocked {
            self.status = GameStatus::GameOver;
            self.events.push(GameEvent::GameOver {
                score: self.progress.score,
            });
        }
    }

    /// Clears full rows and scores them. Returns the number of rows cleared.
    pub fn sweep(&mut self) -> u32 {
        let rows = self.field.sweep_full_rows();
        if rows > 0 {
            let award = self.progress.record_clear(rows);
            self.events.push(GameEvent::LinesCleared {
                rows,
                score_delta: award.score_delta,
            });
            if award.level_up {
                self.events.push(GameEvent::LevelUp {
                    level: self.progress.level,
                });
            }
        }
        rows
    }

    fn shift(&mut self, dx: i16, dy: i16) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };

        piece.position.x += dx;
        piece.position.y += dy;
        if collide(&self.field, piece) {
            piece.position.x -= dx;
            piece.position.y -= dy;
            return false;
        }
        true
    }

    // Merge, respawn, then sweep. The sweep still scores on the lock that
    // ends the game.
    fn lock(&mut self) {
        if let Some(piece) = self.active.as_ref() {
            merge(&mut self.field, piece);
            self.events.push(GameEvent::PieceLocked);
        }
        self.reset_active_piece();
        self.sweep();
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn field(&self) -> &Matrix {
        &self.field
    }

    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn next(&self) -> Option<&Matrix> {
        self.next.as_ref()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.status == GameStatus::Paused
    }

    pub fn drop_counter_ms(&self) -> u64 {
        self.drop_counter_ms
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            field: self.field.clone(),
            active: self.active.clone(),
            next: self.next.clone(),
            status: self.status,
            score: self.progress.score,
            level: self.progress.level,
            lines: self.progress.lines,
            drop_interval_ms: self.progress.drop_interval_ms,
            paused: self.is_paused(),
            game_over: self.is_game_over(),
        }
    }

    /// The field with the active piece drawn over it.
    pub fn render_field(&self) -> Matrix {
        let mut visual = self.field.clone();

        if let Some(piece) = &self.active {
            for (x, y, value) in piece.cells() {
                if visual.get(x, y).is_some() {
                    visual.set(x as usize, y as usize, value);
                }
            }
        }

        visual
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use crate::matrix::{Matrix, FIELD_WIDTH};
    use crate::pieces::PieceKind;

    pub fn empty_field() -> Matrix {
        Matrix::field()
    }

    pub fn fill_row(field: &mut Matrix, y: usize) {
        for x in 0..FIELD_WIDTH {
            field.set(x, y, PieceKind::T.id());
        }
    }

    pub fn fill_row_with_gap(field: &mut Matrix, y: usize, gap_x: usize) {
        for x in 0..FIELD_WIDTH {
            if x != gap_x {
                field.set(x, y, PieceKind::T.id());
            }
        }
    }
}
