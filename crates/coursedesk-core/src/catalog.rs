//! Catalog resources: categories and courses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A REST collection exposed by the backend.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Payload accepted by create and update.
    type Draft: Serialize + Send + Sync;

    /// Collection path relative to the API base, with trailing slash.
    const COLLECTION: &'static str;

    fn id(&self) -> u64;

    /// The editable fields of this item, as a draft to modify and resubmit.
    fn draft(&self) -> Self::Draft;

    /// Detail path for one item.
    fn detail_path(id: u64) -> String {
        format!("{}{}/", Self::COLLECTION, id)
    }
}

/// A course category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for Category {
    type Draft = CategoryDraft;
    const COLLECTION: &'static str = "categories/";

    fn id(&self) -> u64 {
        self.id
    }

    fn draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// A course offered by an instructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub category: Option<u64>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub instructor: u64,
    #[serde(default)]
    pub instructor_username: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Decimal amount as the server formats it, e.g. `"49.99"`.
    pub price: String,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDraft {
    pub category: Option<u64>,
    pub title: String,
    pub description: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<u32>,
}

impl Resource for Course {
    type Draft = CourseDraft;
    const COLLECTION: &'static str = "courses/";

    fn id(&self) -> u64 {
        self.id
    }

    fn draft(&self) -> CourseDraft {
        CourseDraft {
            category: self.category,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            duration_hours: self.duration_hours,
        }
    }
}

/// A list response: either a bare array or a paginated wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> ListPayload<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) => items,
            ListPayload::Paginated { results, .. } => results,
        }
    }

    /// URL of the next page, when the server paginates.
    pub fn next_page(&self) -> Option<&str> {
        match self {
            ListPayload::Bare(_) => None,
            ListPayload::Paginated { next, .. } => next.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_draft_keeps_editable_fields() {
        let course: Course = serde_json::from_value(json!({
            "id": 5,
            "category": 2,
            "category_name": "Design",
            "instructor": 1,
            "title": "Typography",
            "description": "Letters",
            "price": "19.00",
            "duration_hours": 4
        }))
        .unwrap();

        let draft = serde_json::to_value(course.draft()).unwrap();
        assert_eq!(
            draft,
            json!({
                "category": 2,
                "title": "Typography",
                "description": "Letters",
                "price": "19.00",
                "duration_hours": 4
            })
        );
        assert_eq!(Course::detail_path(course.id()), "courses/5/");
    }

    #[test]
    fn list_accepts_bare_array() {
        let payload: ListPayload<Category> = serde_json::from_value(json!([
            {"id": 1, "name": "Programming", "description": null},
            {"id": 2, "name": "Design"}
        ]))
        .unwrap();
        assert!(payload.next_page().is_none());
        let items = payload.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Design");
    }

    #[test]
    fn list_accepts_paginated_wrapper() {
        let payload: ListPayload<Course> = serde_json::from_value(json!({
            "count": 3,
            "next": "http://127.0.0.1:8000/api/courses/?page=2",
            "previous": null,
            "results": [{
                "id": 9,
                "category": 1,
                "category_name": "Programming",
                "instructor": 4,
                "instructor_username": "alice",
                "title": "Rust 101",
                "description": "Ownership and borrowing",
                "price": "49.99",
                "duration_hours": 12
            }]
        }))
        .unwrap();
        assert_eq!(
            payload.next_page(),
            Some("http://127.0.0.1:8000/api/courses/?page=2")
        );
        let items = payload.into_items();
        assert_eq!(items[0].price, "49.99");
        assert_eq!(items[0].id(), 9);
    }

    #[test]
    fn detail_paths() {
        assert_eq!(Category::detail_path(5), "categories/5/");
        assert_eq!(Course::detail_path(12), "courses/12/");
    }
}
