pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,

    -- Structural variant: determines which fields matter and which
    -- algorithm applies.
    goal_type TEXT NOT NULL CHECK(goal_type IN ('task', 'project', 'habit', 'target', 'metric')),

    -- Only a project may be referenced as a parent (enforced on write).
    parent_id INTEGER REFERENCES goals(id) ON DELETE SET NULL,

    -- JSON array of free-form labels.
    domain_tags TEXT NOT NULL DEFAULT '[]',

    -- Habit
    frequency TEXT,
    schedule_days TEXT,
    reminder_time TEXT,
    duration_minutes INTEGER,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,

    -- Target
    target_value REAL,
    current_value REAL NOT NULL DEFAULT 0,
    unit TEXT,

    -- Metric
    target_min REAL,
    target_max REAL,

    -- Common
    deadline TEXT,
    progress INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'completed', 'archived')),
    completed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_id INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    owner_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('done', 'skipped', 'missed')),
    notes TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(goal_id, date)
);

CREATE TABLE IF NOT EXISTS goal_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_id INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    owner_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    value REAL NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,

    -- Eisenhower: 0=urgent, 1=high, 2=medium, 3=low
    priority INTEGER NOT NULL DEFAULT 2,

    deadline TEXT,
    scheduled_start TEXT,
    scheduled_end TEXT,
    estimated_minutes INTEGER,

    -- Fixed-time tasks are never moved by the planner.
    is_fixed INTEGER NOT NULL DEFAULT 0,

    is_recurring INTEGER NOT NULL DEFAULT 0,
    recurrence_rule TEXT,
    recurrence_days TEXT,

    goal_id INTEGER REFERENCES goals(id) ON DELETE SET NULL,

    -- One-shot completion; recurring tasks track per-date occurrences.
    is_completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,

    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS task_occurrences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    owner_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    occurrence_number INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending', 'done', 'skipped')),
    notes TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(task_id, date)
);

CREATE TABLE IF NOT EXISTS time_blocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    days TEXT NOT NULL,
    is_fixed INTEGER NOT NULL DEFAULT 1,
    is_skippable INTEGER NOT NULL DEFAULT 1,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS time_block_skips (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time_block_id INTEGER NOT NULL REFERENCES time_blocks(id) ON DELETE CASCADE,
    owner_id INTEGER NOT NULL,
    skip_date TEXT NOT NULL,
    UNIQUE(time_block_id, skip_date)
);

CREATE INDEX IF NOT EXISTS ix_goals_owner ON goals(owner_id);
CREATE INDEX IF NOT EXISTS ix_goals_parent ON goals(parent_id);
CREATE INDEX IF NOT EXISTS ix_goals_type ON goals(goal_type);
CREATE INDEX IF NOT EXISTS ix_habit_logs_goal ON habit_logs(goal_id);
CREATE INDEX IF NOT EXISTS ix_habit_logs_date ON habit_logs(date);
CREATE INDEX IF NOT EXISTS ix_goal_entries_goal ON goal_entries(goal_id);
CREATE INDEX IF NOT EXISTS ix_tasks_owner ON tasks(owner_id);
CREATE INDEX IF NOT EXISTS ix_tasks_goal ON tasks(goal_id);
CREATE INDEX IF NOT EXISTS ix_tasks_deadline ON tasks(deadline);
CREATE INDEX IF NOT EXISTS ix_task_occ_task ON task_occurrences(task_id);
CREATE INDEX IF NOT EXISTS ix_task_occ_date ON task_occurrences(date);
CREATE INDEX IF NOT EXISTS ix_time_blocks_owner ON time_blocks(owner_id);
"#;
