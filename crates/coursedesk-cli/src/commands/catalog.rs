//! Category and course commands.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;

use coursedesk_core::{Category, CategoryDraft, Course, CourseDraft, Resource};

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CategorySubcommand {
    /// List all categories
    List(ListArgs),

    /// Show one category
    Show(ShowArgs),

    /// Create a category
    Create(CreateCategoryArgs),

    /// Change fields of a category
    Update(UpdateCategoryArgs),

    /// Delete a category
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CourseCommand {
    #[command(subcommand)]
    pub command: CourseSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CourseSubcommand {
    /// List all courses
    List(ListArgs),

    /// Show one course
    Show(ShowArgs),

    /// Create a course
    Create(CreateCourseArgs),

    /// Change fields of a course
    Update(UpdateCourseArgs),

    /// Delete a course
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: u64,

    /// Print the item as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Id of the item to delete
    pub id: u64,
}

#[derive(Args, Debug)]
pub struct CreateCategoryArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateCategoryArgs {
    pub id: u64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateCourseArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Decimal price, e.g. 49.99
    #[arg(long)]
    pub price: String,

    /// Category id
    #[arg(long)]
    pub category: Option<u64>,

    #[arg(long)]
    pub duration_hours: Option<u32>,
}

#[derive(Args, Debug)]
pub struct UpdateCourseArgs {
    pub id: u64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    #[arg(long)]
    pub category: Option<u64>,

    #[arg(long)]
    pub duration_hours: Option<u32>,
}

impl UpdateCategoryArgs {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    fn apply(self, draft: &mut CategoryDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = Some(description);
        }
    }
}

impl UpdateCourseArgs {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.duration_hours.is_none()
    }

    fn apply(self, draft: &mut CourseDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if self.category.is_some() {
            draft.category = self.category;
        }
        if self.duration_hours.is_some() {
            draft.duration_hours = self.duration_hours;
        }
    }
}

fn category_line(c: &Category) -> String {
    match c.description.as_deref() {
        Some(description) => {
            format!("{:>4}  {}  {}", c.id, c.name.bold(), description.dimmed())
        }
        None => format!("{:>4}  {}", c.id, c.name.bold()),
    }
}

fn course_line(c: &Course) -> String {
    let category = c.category_name.as_deref().unwrap_or("-");
    format!(
        "{:>4}  {}  {}  {}",
        c.id,
        c.title.bold(),
        c.price,
        category.dimmed()
    )
}

pub async fn handle_category(cmd: CategoryCommand, ctx: &mut AppContext) -> Result<()> {
    match cmd.command {
        CategorySubcommand::List(args) => list::<Category>(ctx, &args, category_line).await,
        CategorySubcommand::Show(args) => {
            let category = show::<Category>(ctx, &args, "category").await?;
            if !args.json {
                output::field("Name", &category.name);
                output::optional_field("Description", category.description.as_deref().unwrap_or(""));
            }
            Ok(())
        }
        CategorySubcommand::Create(args) => {
            let draft = CategoryDraft {
                name: args.name,
                description: args.description,
            };
            let category = ctx
                .client()
                .create::<Category>(&draft)
                .await
                .context("Failed to create category")?;
            output::success(&format!("Created category {}", category.id));
            output::field("Name", &category.name);
            Ok(())
        }
        CategorySubcommand::Update(args) => {
            if args.is_empty() {
                bail!("Nothing to update. Pass --name or --description.");
            }
            let id = args.id;
            let category = update::<Category>(ctx, id, "category", |draft| args.apply(draft)).await?;
            output::success(&format!("Updated category {}", category.id));
            output::field("Name", &category.name);
            Ok(())
        }
        CategorySubcommand::Delete(args) => delete::<Category>(ctx, args.id, "category").await,
    }
}

pub async fn handle_course(cmd: CourseCommand, ctx: &mut AppContext) -> Result<()> {
    match cmd.command {
        CourseSubcommand::List(args) => list::<Course>(ctx, &args, course_line).await,
        CourseSubcommand::Show(args) => {
            let course = show::<Course>(ctx, &args, "course").await?;
            if !args.json {
                output::field("Title", &course.title);
                output::field("Price", &course.price);
                output::optional_field("Category", course.category_name.as_deref().unwrap_or(""));
                output::optional_field(
                    "Instructor",
                    course.instructor_username.as_deref().unwrap_or(""),
                );
                if let Some(hours) = course.duration_hours {
                    output::field("Duration", &format!("{} h", hours));
                }
                output::optional_field("Description", &course.description);
            }
            Ok(())
        }
        CourseSubcommand::Create(args) => {
            let draft = CourseDraft {
                category: args.category,
                title: args.title,
                description: args.description,
                price: args.price,
                duration_hours: args.duration_hours,
            };
            let course = ctx
                .client()
                .create::<Course>(&draft)
                .await
                .context("Failed to create course")?;
            output::success(&format!("Created course {}", course.id));
            output::field("Title", &course.title);
            output::field("Price", &course.price);
            Ok(())
        }
        CourseSubcommand::Update(args) => {
            if args.is_empty() {
                bail!(
                    "Nothing to update. Pass --title, --description, --price, --category or --duration-hours."
                );
            }
            let id = args.id;
            let course = update::<Course>(ctx, id, "course", |draft| args.apply(draft)).await?;
            output::success(&format!("Updated course {}", course.id));
            output::field("Title", &course.title);
            output::field("Price", &course.price);
            Ok(())
        }
        CourseSubcommand::Delete(args) => delete::<Course>(ctx, args.id, "course").await,
    }
}

async fn list<T>(ctx: &AppContext, args: &ListArgs, line: impl Fn(&T) -> String) -> Result<()>
where
    T: Resource + Serialize,
{
    let items = ctx
        .client()
        .list::<T>()
        .await
        .with_context(|| format!("Failed to list {}", T::COLLECTION.trim_end_matches('/')))?;

    if items.is_empty() {
        eprintln!("{}", "Nothing found.".dimmed());
        return Ok(());
    }

    for item in &items {
        if args.json {
            output::json(item)?;
        } else {
            println!("{}", line(item));
        }
    }

    Ok(())
}

/// Fetch one item; prints it as JSON when asked and hands it back for
/// field-by-field output otherwise.
async fn show<T>(ctx: &AppContext, args: &ShowArgs, noun: &str) -> Result<T>
where
    T: Resource + Serialize,
{
    let item = ctx
        .client()
        .fetch::<T>(args.id)
        .await
        .with_context(|| format!("Failed to load {} {}", noun, args.id))?;

    if args.json {
        output::json_pretty(&item)?;
    } else {
        output::field("ID", &item.id().to_string());
    }

    Ok(item)
}

/// Fetch the current item, apply the changes to its draft, and submit it.
async fn update<T: Resource>(
    ctx: &AppContext,
    id: u64,
    noun: &str,
    change: impl FnOnce(&mut T::Draft),
) -> Result<T> {
    let current = ctx
        .client()
        .fetch::<T>(id)
        .await
        .with_context(|| format!("Failed to load {} {}", noun, id))?;

    let mut draft = current.draft();
    change(&mut draft);

    ctx.client()
        .update::<T>(id, &draft)
        .await
        .with_context(|| format!("Failed to update {} {}", noun, id))
}

async fn delete<T: Resource>(ctx: &AppContext, id: u64, noun: &str) -> Result<()> {
    ctx.client()
        .remove::<T>(id)
        .await
        .with_context(|| format!("Failed to delete {} {}", noun, id))?;

    output::success(&format!("Deleted {} {}", noun, id));
    Ok(())
}
