//! Export documents for integration tests.
//!
//! Builders render the XML shape of a project-management export: `firm`,
//! `clients/client`, and `projects/project` with nested posts, comments,
//! todo lists, items and item comments.

use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct CommentFixture {
    pub id: String,
    pub commentable_id: String,
    pub commentable_type: &'static str,
    pub body: String,
    pub author_id: Option<String>,
    pub created_at: String,
}

pub fn post_comment(id: &str, post_id: &str, created_at: &str) -> CommentFixture {
    CommentFixture {
        id: id.to_string(),
        commentable_id: post_id.to_string(),
        commentable_type: "Post",
        body: format!("Reply {id}"),
        author_id: None,
        created_at: created_at.to_string(),
    }
}

pub fn todo_comment(id: &str, item_id: &str, created_at: &str) -> CommentFixture {
    CommentFixture {
        id: id.to_string(),
        commentable_id: item_id.to_string(),
        commentable_type: "TodoItem",
        body: format!("Note {id}"),
        author_id: None,
        created_at: created_at.to_string(),
    }
}

impl CommentFixture {
    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            "<comment><id>{}</id><commentable-id>{}</commentable-id>\
             <commentable-type>{}</commentable-type><body>{}</body>{}\
             <author-name>Commenter</author-name><created-at>{}</created-at></comment>",
            self.id,
            self.commentable_id,
            self.commentable_type,
            self.body,
            author(self.author_id.as_deref()),
            self.created_at
        );
    }
}

#[derive(Debug, Clone)]
pub struct PostFixture {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub author_id: Option<String>,
    pub comments: Vec<CommentFixture>,
}

pub fn post(id: &str, project_id: &str, title: &str) -> PostFixture {
    PostFixture {
        id: id.to_string(),
        project_id: project_id.to_string(),
        title: title.to_string(),
        author_id: None,
        comments: Vec::new(),
    }
}

impl PostFixture {
    pub fn with_comment(mut self, comment: CommentFixture) -> Self {
        self.comments.push(comment);
        self
    }

    pub fn by(mut self, author_id: &str) -> Self {
        self.author_id = Some(author_id.to_string());
        self
    }

    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            "<post><id>{}</id><project-id>{}</project-id><title>{}</title>\
             <body>&lt;div&gt;Body of {}&lt;/div&gt;</body>{}<author-name>Poster</author-name>\
             <posted-on>2010-03-01T10:00:00Z</posted-on><comments>",
            self.id,
            self.project_id,
            self.title,
            self.id,
            author(self.author_id.as_deref())
        );
        for comment in &self.comments {
            comment.render(out);
        }
        out.push_str("</comments></post>");
    }
}

#[derive(Debug, Clone)]
pub struct TodoItemFixture {
    pub id: String,
    pub todo_list_id: String,
    pub content: String,
    pub completed: bool,
    pub comments_count: Option<String>,
    pub comments: Vec<CommentFixture>,
}

pub fn todo_item(id: &str, list_id: &str, content: &str) -> TodoItemFixture {
    TodoItemFixture {
        id: id.to_string(),
        todo_list_id: list_id.to_string(),
        content: content.to_string(),
        completed: false,
        comments_count: None,
        comments: Vec::new(),
    }
}

impl TodoItemFixture {
    pub fn with_comment(mut self, comment: CommentFixture) -> Self {
        self.comments.push(comment);
        self.comments_count = Some(self.comments.len().to_string());
        self
    }

    pub fn comments_count(mut self, count: &str) -> Self {
        self.comments_count = Some(count.to_string());
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            "<todo-item><id>{}</id><todo-list-id>{}</todo-list-id><content>{}</content>\
             <completed type=\"boolean\">{}</completed><created-at>2010-03-03T09:00:00Z</created-at>\
             <creator-id>11357920</creator-id><creator-name>Creator</creator-name>",
            self.id, self.todo_list_id, self.content, self.completed
        );
        if let Some(count) = &self.comments_count {
            let _ = write!(out, "<comments-count type=\"integer\">{count}</comments-count>");
        }
        out.push_str("<comments>");
        for comment in &self.comments {
            comment.render(out);
        }
        out.push_str("</comments></todo-item>");
    }
}

#[derive(Debug, Clone)]
pub struct TodoListFixture {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub items: Vec<TodoItemFixture>,
    /// Raw XML appended inside the list, outside any item.
    pub extra: String,
}

pub fn todo_list(id: &str, project_id: &str, name: &str) -> TodoListFixture {
    TodoListFixture {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: name.to_string(),
        items: Vec::new(),
        extra: String::new(),
    }
}

impl TodoListFixture {
    pub fn with_item(mut self, item: TodoItemFixture) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_stray_comment(mut self, comment: &CommentFixture) -> Self {
        comment.render(&mut self.extra);
        self
    }

    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            "<todo-list><id>{}</id><project-id>{}</project-id><name>{}</name>\
             <description>List {}</description><complete>false</complete><todo-items>",
            self.id, self.project_id, self.name, self.id
        );
        for item in &self.items {
            item.render(out);
        }
        out.push_str("</todo-items>");
        out.push_str(&self.extra);
        out.push_str("</todo-list>");
    }
}

#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub id: String,
    pub name: String,
    pub status: String,
    pub company_id: Option<String>,
    pub posts: Vec<PostFixture>,
    pub todo_lists: Vec<TodoListFixture>,
}

pub fn project(id: &str, name: &str) -> ProjectFixture {
    ProjectFixture {
        id: id.to_string(),
        name: name.to_string(),
        status: "active".to_string(),
        company_id: None,
        posts: Vec::new(),
        todo_lists: Vec::new(),
    }
}

impl ProjectFixture {
    pub fn archived(mut self) -> Self {
        self.status = "archived".to_string();
        self
    }

    pub fn company(mut self, id: &str) -> Self {
        self.company_id = Some(id.to_string());
        self
    }

    pub fn with_post(mut self, post: PostFixture) -> Self {
        self.posts.push(post);
        self
    }

    pub fn with_todo_list(mut self, list: TodoListFixture) -> Self {
        self.todo_lists.push(list);
        self
    }

    fn render(&self, out: &mut String) {
        let _ = write!(
            out,
            "<project><id>{}</id><name>{}</name><status>{}</status>",
            self.id, self.name, self.status
        );
        if let Some(company) = &self.company_id {
            let _ = write!(out, "<company><id>{company}</id><name>Company {company}</name></company>");
        }
        out.push_str("<posts>");
        for post in &self.posts {
            post.render(out);
        }
        out.push_str("</posts><todo-lists>");
        for list in &self.todo_lists {
            list.render(out);
        }
        out.push_str("</todo-lists></project>");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportFixture {
    pub firm: Option<(String, String)>,
    pub clients: Vec<(String, String)>,
    pub projects: Vec<ProjectFixture>,
}

pub fn export() -> ExportFixture {
    ExportFixture::default()
}

impl ExportFixture {
    pub fn firm(mut self, id: &str, name: &str) -> Self {
        self.firm = Some((id.to_string(), name.to_string()));
        self
    }

    pub fn client(mut self, id: &str, name: &str) -> Self {
        self.clients.push((id.to_string(), name.to_string()));
        self
    }

    pub fn with_project(mut self, project: ProjectFixture) -> Self {
        self.projects.push(project);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<account>");
        if let Some((id, name)) = &self.firm {
            let _ = write!(out, "<firm><id>{id}</id><name>{name}</name></firm>");
        }
        out.push_str("<clients>");
        for (id, name) in &self.clients {
            let _ = write!(out, "<client><id>{id}</id><name>{name}</name></client>");
        }
        out.push_str("</clients><projects>");
        for project in &self.projects {
            project.render(&mut out);
        }
        out.push_str("</projects></account>");
        out
    }
}

fn author(id: Option<&str>) -> String {
    id.map_or_else(
        || "<author-id nil=\"true\"></author-id>".to_string(),
        |id| format!("<author-id>{id}</author-id>"),
    )
}

/// Two active projects with posts, replies, lists, items and item comments,
/// plus one archived project.
pub fn sample_export() -> String {
    export()
        .firm("1", "Acme")
        .client("2", "Globex")
        .with_project(
            project("100", "Website Relaunch")
                .company("2")
                .with_post(
                    post("500", "100", "Kickoff")
                        .by("11357920")
                        .with_comment(post_comment("900", "500", "2010-03-02T10:00:00Z"))
                        .with_comment(post_comment("901", "500", "2010-03-02T11:00:00Z")),
                )
                .with_post(post("501", "100", "Budget"))
                .with_todo_list(
                    todo_list("300", "100", "Launch")
                        .with_item(
                            todo_item("301", "300", "Ship it")
                                .completed()
                                .with_comment(todo_comment("910", "301", "2010-03-04T09:00:00Z"))
                                .with_comment(todo_comment("911", "301", "2010-03-05T09:00:00Z")),
                        )
                        .with_item(todo_item("302", "300", "Announce").comments_count("0")),
                ),
        )
        .with_project(
            project("101", "Intranet")
                .company("1")
                .with_todo_list(
                    todo_list("310", "101", "Backlog").with_item(
                        todo_item("311", "310", "Search")
                            .with_comment(todo_comment("912", "311", "2010-04-01T09:00:00Z")),
                    ),
                ),
        )
        .with_project(
            project("102", "Old Site")
                .archived()
                .with_post(post("502", "102", "Legacy").with_comment(post_comment(
                    "902",
                    "502",
                    "2009-01-01T00:00:00Z",
                ))),
        )
        .render()
}

/// Number of todo comments in [`sample_export`] that become journals.
pub const SAMPLE_JOURNALS: usize = 3;
