//! Read-only view over a project-management XML export.
//!
//! The export is parsed once into a `roxmltree` DOM. Records are read lazily
//! from node handles so a project that is skipped never has its children
//! validated. Every reader fails with [`ImportError::MalformedRecord`] naming
//! the node's id and the missing field.

use crate::error::{ImportError, Result};
use crate::model::{
    Comment, Organization, OrganizationKind, Post, Project, ProjectStatus, TodoItem, TodoList,
};
use crate::util::parse_timestamp;
use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

/// Placeholder id used when a node lacks its own `id` element.
const UNKNOWN_ID: &str = "?";

/// Commentable type of comments attached to posts.
const POST_COMMENTABLE: &str = "Post";
/// Commentable type of comments attached to todo items.
const TODO_ITEM_COMMENTABLE: &str = "TodoItem";

/// A parsed export document.
pub struct Export<'input> {
    doc: Document<'input>,
}

impl<'input> Export<'input> {
    /// Parse an export.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Xml`] if the text is not well-formed XML.
    pub fn parse(text: &'input str) -> Result<Self> {
        let doc = Document::parse(text)?;
        Ok(Self { doc })
    }

    /// The `firm` element followed by every `clients/client`, in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if an organization lacks an `id` or `name`.
    pub fn organizations(&self) -> Result<Vec<Organization>> {
        let root = self.doc.root();
        let firms = root
            .descendants()
            .filter(|n| n.has_tag_name("firm"))
            .map(|n| (n, OrganizationKind::Firm));
        let clients = root
            .descendants()
            .filter(|n| n.has_tag_name("client"))
            .filter(|n| n.parent_element().is_some_and(|p| p.has_tag_name("clients")))
            .map(|n| (n, OrganizationKind::Client));

        firms
            .chain(clients)
            .map(|(node, kind)| {
                let record = Record::new(node);
                Ok(Organization {
                    id: record.required("id")?,
                    name: record.required("name")?,
                    kind,
                })
            })
            .collect()
    }

    /// Every `project` element, in document order.
    pub fn projects(&self) -> impl Iterator<Item = ProjectNode<'_, 'input>> {
        self.doc
            .root()
            .descendants()
            .filter(|n| n.has_tag_name("project"))
            .map(|node| ProjectNode { node })
    }
}

/// Field access on one element: its direct child elements by tag name.
struct Record<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> Record<'a, 'input> {
    const fn new(node: Node<'a, 'input>) -> Self {
        Self { node }
    }

    fn id(&self) -> String {
        self.optional("id").unwrap_or_else(|| UNKNOWN_ID.to_string())
    }

    fn child(&self, field: &str) -> Option<Node<'a, 'input>> {
        self.node.children().find(|n| n.has_tag_name(field))
    }

    /// Concatenated text of a child element, or `None` if the element is
    /// absent or flagged `nil="true"`.
    fn text(&self, field: &str) -> Option<String> {
        let child = self.child(field)?;
        if child.attribute("nil") == Some("true") {
            return None;
        }
        Some(
            child
                .descendants()
                .filter(Node::is_text)
                .filter_map(|n| n.text())
                .collect(),
        )
    }

    /// Trimmed, non-empty text.
    fn optional(&self, field: &str) -> Option<String> {
        self.text(field)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, field: &str) -> Result<String> {
        self.optional(field)
            .ok_or_else(|| ImportError::malformed(self.id(), field))
    }

    /// Raw text that must be present but may be empty (bodies, titles).
    fn required_text(&self, field: &str) -> Result<String> {
        self.text(field)
            .ok_or_else(|| ImportError::malformed(self.id(), field))
    }

    fn required_timestamp(&self, field: &str) -> Result<DateTime<Utc>> {
        let raw = self.required(field)?;
        parse_timestamp(&raw).ok_or_else(|| ImportError::malformed(self.id(), field))
    }

    fn flag(&self, field: &str) -> bool {
        self.optional(field).is_some_and(|v| v == "true")
    }

    fn counter(&self, field: &str) -> Result<Option<u32>> {
        self.optional(field)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ImportError::malformed(self.id(), field))
            })
            .transpose()
    }

    /// Descendant elements named `tag`, excluding the node itself.
    fn descendants(&self, tag: &'static str) -> impl Iterator<Item = Node<'a, 'input>> + use<'a, 'input> {
        let own = self.node;
        own.descendants()
            .filter(move |n| *n != own && n.has_tag_name(tag))
    }

    /// Descendant `comment` elements whose `commentable-type` matches.
    fn comments(&self, commentable: &'static str) -> impl Iterator<Item = CommentNode<'a, 'input>> + use<'a, 'input> {
        self.descendants("comment")
            .filter(move |n| {
                Record::new(*n).optional("commentable-type").as_deref() == Some(commentable)
            })
            .map(|node| CommentNode { node })
    }
}

#[derive(Clone, Copy)]
pub struct ProjectNode<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> ProjectNode<'a, 'input> {
    /// # Errors
    ///
    /// Returns an error if `id` or `name` is missing.
    pub fn read(&self) -> Result<Project> {
        let record = Record::new(self.node);
        let company_id = record
            .child("company")
            .and_then(|company| Record::new(company).optional("id"));
        Ok(Project {
            id: record.required("id")?,
            name: record.required("name")?,
            status: record
                .optional("status")
                .map_or(ProjectStatus::Active, |s| ProjectStatus::parse(&s)),
            company_id,
        })
    }

    pub fn posts(&self) -> impl Iterator<Item = PostNode<'a, 'input>> + use<'a, 'input> {
        Record::new(self.node)
            .descendants("post")
            .map(|node| PostNode { node })
    }

    pub fn todo_lists(&self) -> impl Iterator<Item = TodoListNode<'a, 'input>> + use<'a, 'input> {
        Record::new(self.node)
            .descendants("todo-list")
            .map(|node| TodoListNode { node })
    }
}

#[derive(Clone, Copy)]
pub struct PostNode<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> PostNode<'a, 'input> {
    /// # Errors
    ///
    /// Returns an error if a required post field is missing.
    pub fn read(&self) -> Result<Post> {
        let record = Record::new(self.node);
        Ok(Post {
            id: record.required("id")?,
            project_id: record.required("project-id")?,
            title: record.required_text("title")?,
            body: record.required_text("body")?,
            author_id: record.optional("author-id"),
            author_name: record.optional("author-name").unwrap_or_default(),
            posted_on: record.required_timestamp("posted-on")?,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = CommentNode<'a, 'input>> + use<'a, 'input> {
        Record::new(self.node).comments(POST_COMMENTABLE)
    }
}

#[derive(Clone, Copy)]
pub struct CommentNode<'a, 'input> {
    node: Node<'a, 'input>,
}

impl CommentNode<'_, '_> {
    /// # Errors
    ///
    /// Returns an error if a required comment field is missing.
    pub fn read(&self) -> Result<Comment> {
        let record = Record::new(self.node);
        Ok(Comment {
            id: record.required("id")?,
            commentable_id: record.required("commentable-id")?,
            body: record.required_text("body")?,
            author_id: record.optional("author-id"),
            author_name: record.optional("author-name").unwrap_or_default(),
            created_at: record.required_timestamp("created-at")?,
        })
    }
}

#[derive(Clone, Copy)]
pub struct TodoListNode<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> TodoListNode<'a, 'input> {
    /// # Errors
    ///
    /// Returns an error if `id`, `project-id` or `name` is missing.
    pub fn read(&self) -> Result<TodoList> {
        let record = Record::new(self.node);
        Ok(TodoList {
            id: record.required("id")?,
            project_id: record.required("project-id")?,
            name: record.required("name")?,
            description: record.text("description").unwrap_or_default(),
            complete: record.flag("complete"),
            creator_id: record.optional("creator-id"),
        })
    }

    pub fn items(&self) -> impl Iterator<Item = TodoItemNode<'a, 'input>> + use<'a, 'input> {
        Record::new(self.node)
            .descendants("todo-item")
            .map(|node| TodoItemNode { node })
    }
}

#[derive(Clone, Copy)]
pub struct TodoItemNode<'a, 'input> {
    node: Node<'a, 'input>,
}

impl<'a, 'input> TodoItemNode<'a, 'input> {
    /// # Errors
    ///
    /// Returns an error if a required item field is missing or the comment
    /// counter is not a number.
    pub fn read(&self) -> Result<TodoItem> {
        let record = Record::new(self.node);
        Ok(TodoItem {
            id: record.required("id")?,
            todo_list_id: record.required("todo-list-id")?,
            content: record.required_text("content")?,
            completed: record.flag("completed"),
            created_at: record.required_timestamp("created-at")?,
            responsible_party_id: record.optional("responsible-party-id"),
            creator_id: record.optional("creator-id"),
            creator_name: record.optional("creator-name").unwrap_or_default(),
            comments_count: record.counter("comments-count")?,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = CommentNode<'a, 'input>> + use<'a, 'input> {
        Record::new(self.node).comments(TODO_ITEM_COMMENTABLE)
    }
}
