use crate::mappings::KeyNames;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Код клавиши (evdev коды, кнопки мыши тоже живут в этом пространстве)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyNames::name_of(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const CTRL: u8 = 0b001;
    pub const ALT: u8 = 0b010;
    pub const SHIFT: u8 = 0b100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.ctrl { bits |= Self::CTRL; }
        if self.alt { bits |= Self::ALT; }
        if self.shift { bits |= Self::SHIFT; }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            ctrl: bits & Self::CTRL != 0,
            alt: bits & Self::ALT != 0,
            shift: bits & Self::SHIFT != 0,
        }
    }

    /// Все ли модификаторы `self` зажаты в `held`
    pub fn is_subset_of(&self, held: Modifiers) -> bool {
        self.bits() & !held.bits() == 0
    }

    /// Непустые надмножества текущего набора, не включающие его самого.
    /// Для k уже установленных модификаторов их ровно 2^(3-k) - 1.
    pub fn strict_supersets(&self) -> SmallVec<[Modifiers; 7]> {
        let own = self.bits();
        let unset = !own & (Self::CTRL | Self::ALT | Self::SHIFT);
        let mut result = SmallVec::new();
        // Перебор непустых подмножеств unset
        let mut subset = unset;
        while subset != 0 {
            result.push(Self::from_bits(own | subset));
            subset = (subset - 1) & unset;
        }
        result
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Сочетание в том виде, в каком его регистрирует ОС
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key_code: KeyCode,
    pub modifiers: Modifiers,
}

impl Chord {
    pub fn new(key_code: KeyCode, modifiers: Modifiers) -> Self {
        Self { key_code, modifiers }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_code)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key_code)
        }
    }
}

/// Одна привязка: клавиша + ctrl/alt/shift + флаг включения.
///
/// Порядок полей задаёт лексикографическое сравнение (key_code, ctrl, alt, shift, enabled),
/// которое нужно только для стабильной сортировки и дедупликации.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binding {
    pub key_code: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub enabled: bool,
}

impl Binding {
    pub fn new(key_code: u16, modifiers: Modifiers) -> Self {
        Self {
            key_code: KeyCode(key_code),
            ctrl: modifiers.ctrl,
            alt: modifiers.alt,
            shift: modifiers.shift,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
        }
    }

    pub fn chord(&self) -> Chord {
        Chord::new(self.key_code, self.modifiers())
    }

    pub fn is_unset(&self) -> bool {
        self.key_code.is_unset()
    }

    pub fn is_mouse(&self) -> bool {
        super::MouseButton::from_key_code(self.key_code).is_some()
    }

    /// `enabled,keyCode,ctrl,alt,shift`, булевы значения как 0/1
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.enabled as u8,
            self.key_code.value(),
            self.ctrl as u8,
            self.alt as u8,
            self.shift as u8
        )
    }

    /// Обратная к `encode`. Любая ошибка разбора даёт выключенную нулевую привязку.
    pub fn decode(raw: &str) -> Self {
        Self::try_decode(raw).unwrap_or_default()
    }

    fn try_decode(raw: &str) -> Option<Self> {
        let fields: SmallVec<[&str; 5]> = raw.trim().split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return None;
        }

        let flag = |s: &str| match s {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        };

        Some(Self {
            enabled: flag(fields[0])?,
            key_code: KeyCode(fields[1].parse().ok()?),
            ctrl: flag(fields[2])?,
            alt: flag(fields[3])?,
            shift: flag(fields[4])?,
        })
    }

    /// Разбор человекочитаемого вида `ctrl+alt+f1`
    pub fn from_chord(text: &str) -> std::result::Result<Self, String> {
        let mut modifiers = Modifiers::new();
        let mut key = None;

        for part in text.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                other => {
                    if key.is_some() {
                        return Err(format!("Несколько клавиш в сочетании: {}", text));
                    }
                    key = Some(KeyNames::code_of(other)?);
                }
            }
        }

        let key = key.ok_or_else(|| format!("В сочетании нет основной клавиши: {}", text))?;
        Ok(Self::new(key, modifiers))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chord())?;
        if !self.enabled {
            write!(f, " (выкл.)")?;
        }
        Ok(())
    }
}

/// Упорядоченный список привязок одной цели. Первая привязка считается основной.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingList(SmallVec<[Binding; 2]>);

impl BindingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(binding: Binding) -> Self {
        let mut list = Self::new();
        list.push(binding);
        list
    }

    /// Добавить привязку. Пустые сочетания и дубликаты пропускаются.
    pub fn push(&mut self, binding: Binding) -> bool {
        if binding.is_unset() || self.0.contains(&binding) {
            return false;
        }
        self.0.push(binding);
        true
    }

    pub fn primary(&self) -> Option<&Binding> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, binding: &Binding) -> bool {
        self.0.contains(binding)
    }

    /// Привязки цели через `|`
    pub fn encode(&self) -> String {
        self.encode_with('|')
    }

    pub fn decode(raw: &str) -> Self {
        Self::decode_with(raw, '|')
    }

    pub fn encode_with(&self, separator: char) -> String {
        self.0
            .iter()
            .map(Binding::encode)
            .collect::<Vec<_>>()
            .join(&separator.to_string())
    }

    pub fn decode_with(raw: &str, separator: char) -> Self {
        let mut list = Self::new();
        for part in raw.split(separator).filter(|p| !p.trim().is_empty()) {
            list.push(Binding::decode(part));
        }
        list
    }
}

impl FromIterator<Binding> for BindingList {
    fn from_iter<I: IntoIterator<Item = Binding>>(iter: I) -> Self {
        let mut list = Self::new();
        for binding in iter {
            list.push(binding);
        }
        list
    }
}

impl<'a> IntoIterator for &'a BindingList {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for BindingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self.0.iter().map(|b| b.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}
