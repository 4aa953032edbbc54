use super::enemy::EnemyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOwner {
    Enemy(EnemyId),
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    AttackCooldownComplete,
    DeathAnimationComplete,
    ReloadComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredTask {
    pub owner: TaskOwner,
    pub kind: TaskKind,
    pub due_at: f64,
    sequence: u64,
}

/// Fixed-delay effects, drained once per tick against the tick timestamp.
///
/// Tasks carry only their owner; whoever applies them must check the owner
/// is still live, so a task outliving its entity is a silent no-op.
#[derive(Debug, Default, Clone)]
pub struct DeferredTaskQueue {
    tasks: Vec<DeferredTask>,
    next_sequence: u64,
}

impl DeferredTaskQueue {
    pub fn schedule(&mut self, owner: TaskOwner, kind: TaskKind, due_at: f64) {
        self.tasks.push(DeferredTask {
            owner,
            kind,
            due_at,
            sequence: self.next_sequence,
        });
        self.next_sequence = self.next_sequence.saturating_add(1);
    }

    pub fn drain_due(&mut self, now: f64) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.due_at <= now {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.due_at
                .total_cmp(&b.due_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        due
    }

    pub fn cancel_owner(&mut self, owner: TaskOwner) {
        self.tasks.retain(|task| task.owner != owner);
    }

    /// Drops every enemy-owned task; player tasks survive scene changes.
    pub fn cancel_enemy_tasks(&mut self) {
        self.tasks
            .retain(|task| !matches!(task.owner, TaskOwner::Enemy(_)));
    }

    pub fn is_pending(&self, owner: TaskOwner, kind: TaskKind) -> bool {
        self.tasks
            .iter()
            .any(|task| task.owner == owner && task.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
