//! User-facing texts for notices and failures.

use std::{fmt, str::FromStr};

use shared::error::FailureKind;

use crate::{error::ClientError, resource::ActionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Uz,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "uz" => Ok(Self::Uz),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported locale '{other}' (expected uz or en)")),
        }
    }
}

/// What the user was doing when a notice or failure was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update,
    Remove,
    Action(ActionKind),
    SignIn,
    Lookup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Remove => f.write_str("remove"),
            Self::Action(kind) => write!(f, "{kind}"),
            Self::SignIn => f.write_str("sign-in"),
            Self::Lookup => f.write_str("lookup"),
        }
    }
}

/// A failure as it should be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayError {
    pub kind: FailureKind,
    pub message: String,
}

impl DisplayError {
    pub fn new(err: &ClientError, operation: Operation, locale: Locale) -> Self {
        Self {
            kind: err.kind(),
            message: user_message(err, operation, locale),
        }
    }
}

/// The server's message wins whenever present; otherwise the failure kind picks
/// a text, falling back to a per-operation one.
pub fn user_message(err: &ClientError, operation: Operation, locale: Locale) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }

    let by_kind = match (err, locale) {
        (ClientError::Network { .. }, Locale::Uz) if operation == Operation::SignIn => {
            Some("Internet bilan aloqa yo'q yoki Backend ishlamayapti")
        }
        (ClientError::Network { .. }, Locale::En) if operation == Operation::SignIn => {
            Some("No connection or the backend is down")
        }
        (ClientError::Network { .. }, Locale::Uz) => {
            Some("Backend bilan bog'lanib bo'lmadi! Backend ishga tushganini tekshiring.")
        }
        (ClientError::Network { .. }, Locale::En) => {
            Some("Could not reach the backend. Check that it is running.")
        }
        (ClientError::Auth { .. }, _) if operation == Operation::SignIn => None,
        (ClientError::Auth { .. }, Locale::Uz) => Some("Token muddati tugagan yoki noto'g'ri."),
        (ClientError::Auth { .. }, Locale::En) => Some("Session expired or invalid. Sign in again."),
        (ClientError::Forbidden { .. }, Locale::Uz) => {
            Some("Sizda bu ma'lumotlarni ko'rish huquqi yo'q!")
        }
        (ClientError::Forbidden { .. }, Locale::En) => {
            Some("You do not have permission for this action.")
        }
        (ClientError::Format(_), Locale::Uz) => Some("Ma'lumot formati noto'g'ri!"),
        (ClientError::Format(_), Locale::En) => Some("The server returned data in an unexpected format."),
        (ClientError::NotFound { .. }, Locale::Uz) => Some("API endpoint topilmadi!"),
        (ClientError::NotFound { .. }, Locale::En) => Some("API endpoint not found."),
        (ClientError::Busy, Locale::Uz) => Some("Amal bajarilmoqda, iltimos kuting."),
        (ClientError::Busy, Locale::En) => Some("Another operation is still running."),
        (ClientError::Unsupported { .. }, Locale::Uz) => Some("Bu amal qo'llab-quvvatlanmaydi."),
        (ClientError::Unsupported { .. }, Locale::En) => Some("This operation is not available."),
        (ClientError::MissingField(field), Locale::Uz) => {
            return format!("Majburiy maydon to'ldirilmagan: {field}");
        }
        (ClientError::MissingField(field), Locale::En) => {
            return format!("Required field is missing: {field}");
        }
        _ => None,
    };

    by_kind
        .unwrap_or_else(|| failure_fallback(operation, locale))
        .to_string()
}

pub fn failure_fallback(operation: Operation, locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => match operation {
            Operation::Load => "Ma'lumotlarni yuklashda xatolik!",
            Operation::Create | Operation::Update => "Xatolik yuz berdi!",
            Operation::Remove | Operation::Action(ActionKind::Fire) => "O'chirishda xatolik!",
            Operation::Action(ActionKind::Leave) => "Ta'tilga chiqarishda xatolik!",
            Operation::Action(ActionKind::Return) => "Qaytarishda xatolik!",
            Operation::Action(ActionKind::SetEndDate) => "Tugash vaqtini belgilashda xatolik!",
            Operation::Action(_) => "Amalni bajarishda xatolik!",
            Operation::SignIn => "Email yoki parol xato!",
            Operation::Lookup => "Qidiruvda xatolik!",
        },
        Locale::En => match operation {
            Operation::Load => "Failed to load data.",
            Operation::Create | Operation::Update => "Something went wrong.",
            Operation::Remove | Operation::Action(ActionKind::Fire) => "Failed to delete.",
            Operation::Action(ActionKind::Leave) => "Failed to place on leave.",
            Operation::Action(ActionKind::Return) => "Failed to return from leave.",
            Operation::Action(ActionKind::SetEndDate) => "Failed to set the end date.",
            Operation::Action(_) => "Failed to perform the action.",
            Operation::SignIn => "Wrong email or password.",
            Operation::Lookup => "Search failed.",
        },
    }
}

pub fn success_notice(operation: Operation, count: Option<usize>, locale: Locale) -> String {
    match (locale, operation) {
        (Locale::Uz, Operation::Load) => format!("{} ta yozuv yuklandi", count.unwrap_or(0)),
        (Locale::En, Operation::Load) => format!("{} records loaded", count.unwrap_or(0)),
        (Locale::Uz, op) => uz_success(op).to_string(),
        (Locale::En, op) => en_success(op).to_string(),
    }
}

fn uz_success(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "Muvaffaqiyatli qo'shildi!",
        Operation::Update => "Muvaffaqiyatli yangilandi!",
        Operation::Remove => "O'chirildi!",
        Operation::Action(ActionKind::Leave) => "Ta'tilga chiqarildi!",
        Operation::Action(ActionKind::Return) => "Qaytarildi!",
        Operation::Action(ActionKind::Freeze) => "Muzlatildi!",
        Operation::Action(ActionKind::Unfreeze) => "Eritildi!",
        Operation::Action(ActionKind::Fire) => "Ishdan bo'shatildi!",
        Operation::Action(ActionKind::Rehire) => "Qayta ishga olindi!",
        Operation::Action(ActionKind::SetEndDate) => "Tugash vaqti belgilandi!",
        Operation::SignIn => "Tizimga kirildi",
        Operation::Load | Operation::Lookup => "Tayyor",
    }
}

fn en_success(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "Created.",
        Operation::Update => "Updated.",
        Operation::Remove => "Deleted.",
        Operation::Action(ActionKind::Leave) => "Placed on leave.",
        Operation::Action(ActionKind::Return) => "Returned from leave.",
        Operation::Action(ActionKind::Freeze) => "Frozen.",
        Operation::Action(ActionKind::Unfreeze) => "Unfrozen.",
        Operation::Action(ActionKind::Fire) => "Dismissed.",
        Operation::Action(ActionKind::Rehire) => "Rehired.",
        Operation::Action(ActionKind::SetEndDate) => "End date set.",
        Operation::SignIn => "Signed in.",
        Operation::Load | Operation::Lookup => "Done.",
    }
}
