use super::WindowHandle;
use smallvec::SmallVec;
use std::fmt;

/// Направление цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "вперёд"),
            Direction::Backward => write!(f, "назад"),
        }
    }
}

/// Неявные пулы окон, которые не настраиваются по именам
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolKind {
    /// Окна клиента, в которых ещё не выбран персонаж
    NotLoggedIn,
    /// Окна сторонних приложений
    Other,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::NotLoggedIn => write!(f, "Цикл неавторизованных окон"),
            PoolKind::Other => write!(f, "Цикл сторонних окон"),
        }
    }
}

/// Логическая цель привязки
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    Suspend,
    Character(String),
    Group(String, Direction),
    Pool(PoolKind, Direction),
    CloseAll,
    Profile(String),
}

impl TargetId {
    /// Пропускают ли действия этой цели исходное нажатие дальше
    pub fn is_consuming(&self) -> bool {
        matches!(self, TargetId::Suspend | TargetId::CloseAll | TargetId::Profile(_))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Suspend => write!(f, "Приостановка горячих клавиш"),
            TargetId::Character(name) => write!(f, "Персонаж '{}'", name),
            TargetId::Group(name, direction) => write!(f, "Группа '{}' ({})", name, direction),
            TargetId::Pool(kind, direction) => write!(f, "{} ({})", kind, direction),
            TargetId::CloseAll => write!(f, "Закрыть все клиенты"),
            TargetId::Profile(name) => write!(f, "Профиль '{}'", name),
        }
    }
}

/// Семантическое действие, которое получает слой управления окнами
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    ActivateCharacter(String),
    CycleGroup { group: String, direction: Direction },
    CycleNotLoggedIn(Direction),
    CycleOther(Direction),
    /// Окно, выбранное циклом
    ActivateWindow(WindowHandle),
    SuspendChanged(bool),
    SwitchProfile(String),
    CloseAll,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyAction::ActivateCharacter(name) => write!(f, "activate-character({})", name),
            HotkeyAction::CycleGroup { group, direction } => match direction {
                Direction::Forward => write!(f, "cycle-group-forward({})", group),
                Direction::Backward => write!(f, "cycle-group-backward({})", group),
            },
            HotkeyAction::CycleNotLoggedIn(Direction::Forward) => write!(f, "cycle-unidentified-forward"),
            HotkeyAction::CycleNotLoggedIn(Direction::Backward) => write!(f, "cycle-unidentified-backward"),
            HotkeyAction::CycleOther(Direction::Forward) => write!(f, "cycle-other-forward"),
            HotkeyAction::CycleOther(Direction::Backward) => write!(f, "cycle-other-backward"),
            HotkeyAction::ActivateWindow(handle) => write!(f, "activate-window({})", handle),
            HotkeyAction::SuspendChanged(suspended) => write!(f, "suspend-state-changed({})", suspended),
            HotkeyAction::SwitchProfile(name) => write!(f, "switch-profile({})", name),
            HotkeyAction::CloseAll => write!(f, "close-all"),
        }
    }
}

/// Результат обработки одного сырого события
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Поглощено ли нажатие (не передаётся активному приложению)
    pub consumed: bool,
    pub actions: SmallVec<[HotkeyAction; 2]>,
}

impl DispatchOutcome {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn with_action(consumed: bool, action: HotkeyAction) -> Self {
        let mut actions = SmallVec::new();
        actions.push(action);
        Self { consumed, actions }
    }

    pub fn push(&mut self, action: HotkeyAction) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
