//! Input validation
//!
//! Turns loosely typed request bodies into drafts the database layer can store as-is. Every
//! check runs before the first query, and all failures of one request are reported together.
use crate::database::types::{
    BookFormat, BookPatch, BookStatus, NewBook, NewWishlistItem, Priority, WishlistPatch,
};
use crate::errors::{FieldError, LibraryError};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Order in which wishlist field errors are reported
const WISHLIST_FIELDS: [&str; 7] = [
    "title",
    "author",
    "publisher",
    "genre",
    "translator",
    "note",
    "priority",
];

/// A book that passed validation, ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BookDraft {
    pub title: String,
    pub cover_image: String,
    pub author: String,
    pub genre: String,
    pub format: BookFormat,
    pub translator: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub page_count: Option<i64>,
    pub publisher: Option<String>,
    pub status: BookStatus,
    pub progress: Option<i64>,
    pub rating: Option<i64>,
    pub review: Option<String>,
}

/// A wishlist item that passed validation, strings trimmed and blank optionals cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WishlistDraft {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub translator: Option<String>,
    pub note: Option<String>,
    pub priority: Priority,
}

/// Validated wishlist patch. `None` leaves a column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WishlistChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<Option<String>>,
    pub genre: Option<Option<String>>,
    pub translator: Option<Option<String>>,
    pub note: Option<Option<String>>,
    pub priority: Option<Priority>,
}

/// Field rules shared by wishlist creation and update. Absent fields are skipped, so creation
/// checks for required fields separately.
#[derive(Debug, Default, Validate)]
struct WishlistFields {
    #[validate(
        custom(function = "title_not_blank"),
        length(max = 255, message = "عنوان کتاب نمی‌تواند بیش از 255 کاراکتر باشد")
    )]
    title: Option<String>,
    #[validate(
        custom(function = "author_not_blank"),
        length(max = 255, message = "نام نویسنده نمی‌تواند بیش از 255 کاراکتر باشد")
    )]
    author: Option<String>,
    #[validate(length(max = 255, message = "نام ناشر نمی‌تواند بیش از 255 کاراکتر باشد"))]
    publisher: Option<String>,
    #[validate(length(max = 100, message = "ژانر نمی‌تواند بیش از 100 کاراکتر باشد"))]
    genre: Option<String>,
    #[validate(length(max = 255, message = "نام مترجم نمی‌تواند بیش از 255 کاراکتر باشد"))]
    translator: Option<String>,
    #[validate(length(max = 1000, message = "یادداشت نمی‌تواند بیش از 1000 کاراکتر باشد"))]
    note: Option<String>,
    #[validate(custom(function = "known_priority"))]
    priority: Option<String>,
}

fn blank_error(message: &'static str) -> ValidationError {
    ValidationError::new("blank").with_message(Cow::Borrowed(message))
}

fn title_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(blank_error("عنوان کتاب نمی‌تواند خالی باشد"));
    }
    Ok(())
}

fn author_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(blank_error("نام نویسنده نمی‌تواند خالی باشد"));
    }
    Ok(())
}

fn known_priority(value: &str) -> Result<(), ValidationError> {
    value.parse::<Priority>().map(|_| ()).map_err(|_| {
        ValidationError::new("priority").with_message(Cow::Borrowed("اولویت معتبر انتخاب کنید"))
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_owned())
}

/// Trims an optional column and turns blank text into `None`
fn cleared(value: Option<String>) -> Option<String> {
    trimmed(value).filter(|text| !text.is_empty())
}

/// Flattens a validator report into field errors, ordered like `order`
fn field_errors(report: &ValidationErrors, order: &[&str]) -> Vec<(usize, FieldError)> {
    let mut found = Vec::new();
    for (field, errors) in report.field_errors() {
        let name: &str = &field;
        let rank = order
            .iter()
            .position(|known| *known == name)
            .unwrap_or(order.len());
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string);
            found.push((rank, FieldError::new(name, &message)));
        }
    }
    found
}

fn finish(mut found: Vec<(usize, FieldError)>) -> Result<(), LibraryError> {
    if found.is_empty() {
        return Ok(());
    }
    found.sort_by_key(|&(rank, _)| rank);
    Err(LibraryError::Validation(
        found.into_iter().map(|(_, error)| error).collect(),
    ))
}

fn rank_of(field: &str) -> usize {
    WISHLIST_FIELDS
        .iter()
        .position(|known| *known == field)
        .unwrap_or(WISHLIST_FIELDS.len())
}

fn check_wishlist_fields(fields: &WishlistFields) -> Vec<(usize, FieldError)> {
    fields
        .validate()
        .err()
        .map(|report| field_errors(&report, &WISHLIST_FIELDS))
        .unwrap_or_default()
}

fn parse_priority(value: Option<&str>) -> Option<Priority> {
    value.and_then(|text| text.parse().ok())
}

/// Validates and normalizes a new wishlist item
/// # Errors
/// Returns [`LibraryError::Validation`] listing every offending field.
pub(crate) fn validate_new_wishlist_item(
    input: NewWishlistItem,
) -> Result<WishlistDraft, LibraryError> {
    let fields = WishlistFields {
        title: trimmed(input.title),
        author: trimmed(input.author),
        publisher: trimmed(input.publisher),
        genre: trimmed(input.genre),
        translator: trimmed(input.translator),
        note: trimmed(input.note),
        priority: input.priority,
    };

    let mut found = check_wishlist_fields(&fields);
    if fields.title.is_none() {
        found.push((rank_of("title"), FieldError::new("title", "عنوان کتاب الزامی است")));
    }
    if fields.author.is_none() {
        found.push((rank_of("author"), FieldError::new("author", "نام نویسنده الزامی است")));
    }
    if fields.priority.is_none() {
        found.push((rank_of("priority"), FieldError::new("priority", "اولویت الزامی است")));
    }
    finish(found)?;

    let priority = parse_priority(fields.priority.as_deref());
    match (fields.title, fields.author, priority) {
        (Some(title), Some(author), Some(priority)) => Ok(WishlistDraft {
            title,
            author,
            publisher: cleared(fields.publisher),
            genre: cleared(fields.genre),
            translator: cleared(fields.translator),
            note: cleared(fields.note),
            priority,
        }),
        _ => Err(LibraryError::invalid("priority", "اولویت معتبر انتخاب کنید")),
    }
}

/// Validates the fields present in a wishlist patch
/// # Errors
/// Returns [`LibraryError::EmptyUpdate`] if the patch names no field and
/// [`LibraryError::Validation`] if any present field is invalid.
pub(crate) fn validate_wishlist_patch(
    patch: WishlistPatch,
) -> Result<WishlistChanges, LibraryError> {
    if patch.is_empty() {
        return Err(LibraryError::EmptyUpdate);
    }
    let fields = WishlistFields {
        title: trimmed(patch.title),
        author: trimmed(patch.author),
        publisher: trimmed(patch.publisher.clone().flatten()),
        genre: trimmed(patch.genre.clone().flatten()),
        translator: trimmed(patch.translator.clone().flatten()),
        note: trimmed(patch.note.clone().flatten()),
        priority: patch.priority,
    };
    finish(check_wishlist_fields(&fields))?;

    Ok(WishlistChanges {
        title: fields.title,
        author: fields.author,
        publisher: patch.publisher.map(cleared),
        genre: patch.genre.map(cleared),
        translator: patch.translator.map(cleared),
        note: patch.note.map(cleared),
        priority: parse_priority(fields.priority.as_deref()),
    })
}

fn progress_error(progress: Option<i64>) -> Option<FieldError> {
    progress
        .filter(|value| !(0..=100).contains(value))
        .map(|_| FieldError::new("progress", "پیشرفت باید بین 0 تا 100 باشد"))
}

/// Validates a new book. Required text fields must contain more than whitespace.
/// # Errors
/// Returns [`LibraryError::Validation`] listing every missing or invalid field.
pub(crate) fn validate_new_book(input: NewBook) -> Result<BookDraft, LibraryError> {
    let title = cleared(input.title);
    let cover_image = cleared(input.cover_image);
    let author = cleared(input.author);
    let genre = cleared(input.genre);

    let mut errors = Vec::new();
    if title.is_none() {
        errors.push(FieldError::new("title", "عنوان کتاب الزامی است"));
    }
    if cover_image.is_none() {
        errors.push(FieldError::new("coverImage", "تصویر جلد الزامی است"));
    }
    if author.is_none() {
        errors.push(FieldError::new("author", "نام نویسنده الزامی است"));
    }
    if genre.is_none() {
        errors.push(FieldError::new("genre", "ژانر الزامی است"));
    }
    if input.format.is_none() {
        errors.push(FieldError::new("format", "قالب کتاب الزامی است"));
    }
    errors.extend(progress_error(input.progress));

    match (title, cover_image, author, genre, input.format) {
        (Some(title), Some(cover_image), Some(author), Some(genre), Some(format))
            if errors.is_empty() =>
        {
            Ok(BookDraft {
                title,
                cover_image,
                author,
                genre,
                format,
                translator: input.translator,
                description: input.description,
                country: input.country,
                page_count: input.page_count,
                publisher: input.publisher,
                status: input.status.unwrap_or_default(),
                progress: input.progress,
                rating: input.rating,
                review: input.review,
            })
        }
        _ => Err(LibraryError::Validation(errors)),
    }
}

/// Checks the values of a book patch. Emptiness is checked by the caller, after ownership.
/// # Errors
/// Returns [`LibraryError::Validation`] for blank required columns or out of range progress.
pub(crate) fn validate_book_patch(patch: &BookPatch) -> Result<(), LibraryError> {
    let mut errors = Vec::new();
    let required = [
        ("title", patch.title.as_deref(), "عنوان کتاب نمی‌تواند خالی باشد"),
        ("coverImage", patch.cover_image.as_deref(), "تصویر جلد نمی‌تواند خالی باشد"),
        ("author", patch.author.as_deref(), "نام نویسنده نمی‌تواند خالی باشد"),
        ("genre", patch.genre.as_deref(), "ژانر نمی‌تواند خالی باشد"),
    ];
    for (field, value, message) in required {
        if value.is_some_and(|text| text.trim().is_empty()) {
            errors.push(FieldError::new(field, message));
        }
    }
    errors.extend(progress_error(patch.progress.flatten()));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LibraryError::Validation(errors))
    }
}
