use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};

use crate::error::FormError;
use crate::models::NewTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    DueDate,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Title, FormField::Description, FormField::DueDate];

    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::DueDate,
            FormField::DueDate => FormField::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Title => FormField::DueDate,
            FormField::Description => FormField::Title,
            FormField::DueDate => FormField::Description,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::DueDate => "Due date (YYYY-MM-DD)",
        }
    }
}

/// Raw text of the creation form, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

impl CreateForm {
    pub fn new(title: &str, description: &str, due_date: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            due_date: due_date.to_string(),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::DueDate => &self.due_date,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
            FormField::DueDate => &mut self.due_date,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Builds the request body. `Ok(None)` means the title is blank and nothing should be sent.
    pub fn to_new_task(&self) -> Result<Option<NewTask>, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        Ok(Some(NewTask {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            due_date: normalize_due_date(&self.due_date)?,
        }))
    }
}

/// Turns a calendar date into a UTC-midnight timestamp (`2024-01-05T00:00:00.000Z`).
/// Full RFC 3339 input is accepted and converted to the same UTC form.
pub fn normalize_due_date(raw: &str) -> Result<Option<String>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| FormError::InvalidDueDate(raw.to_string()))?;
        return Ok(Some(
            Utc.from_utc_datetime(&midnight)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(
            stamp
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
    }

    Err(FormError::InvalidDueDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_builds_nothing() {
        assert_eq!(CreateForm::new("", "desc", "").to_new_task(), Ok(None));
        assert_eq!(
            CreateForm::new("   \t", "", "2024-01-05").to_new_task(),
            Ok(None)
        );
    }

    #[test]
    fn title_and_description_are_trimmed() {
        let task = CreateForm::new("  Buy milk ", "  two litres ", "")
            .to_new_task()
            .unwrap()
            .expect("title present");
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "two litres");
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn calendar_date_becomes_utc_midnight_timestamp() {
        assert_eq!(
            normalize_due_date("2024-01-05"),
            Ok(Some("2024-01-05T00:00:00.000Z".to_string()))
        );
        assert_eq!(
            normalize_due_date(" 2024-02-29 "),
            Ok(Some("2024-02-29T00:00:00.000Z".to_string()))
        );
    }

    #[test]
    fn full_timestamp_is_converted_to_utc() {
        assert_eq!(
            normalize_due_date("2024-01-05T10:30:00+02:00"),
            Ok(Some("2024-01-05T08:30:00.000Z".to_string()))
        );
    }

    #[test]
    fn unparseable_due_date_is_rejected() {
        assert_eq!(
            normalize_due_date("2023-02-30"),
            Err(FormError::InvalidDueDate("2023-02-30".to_string()))
        );
        assert!(CreateForm::new("A", "", "next week")
            .to_new_task()
            .is_err());
    }

    #[test]
    fn field_accessors_and_cycle() {
        let mut form = CreateForm::default();
        let mut field = FormField::Title;
        for text in ["t", "d", "2024-01-05"] {
            form.field_mut(field).push_str(text);
            field = field.next();
        }
        assert_eq!(field, FormField::Title);
        assert_eq!(form, CreateForm::new("t", "d", "2024-01-05"));
        assert_eq!(form.field(FormField::DueDate), "2024-01-05");
        assert_eq!(FormField::Title.prev(), FormField::DueDate);

        form.clear();
        assert_eq!(form, CreateForm::default());
    }
}
