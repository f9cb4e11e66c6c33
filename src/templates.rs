//! HTML rendering with tera. The templates are compiled into the binary.
use poem::web::Html;
use tera::{Context, Tera};

use crate::auth::Viewer;
use crate::error::AppError;

const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("includes/post_card.html", include_str!("../templates/includes/post_card.html")),
    ("includes/paginator.html", include_str!("../templates/includes/paginator.html")),
    ("includes/form_errors.html", include_str!("../templates/includes/form_errors.html")),
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    ("posts/group_list.html", include_str!("../templates/posts/group_list.html")),
    ("posts/profile.html", include_str!("../templates/posts/profile.html")),
    ("posts/post_detail.html", include_str!("../templates/posts/post_detail.html")),
    ("posts/create.html", include_str!("../templates/posts/create.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(name, ctx)?))
    }
}

/// Context every page starts from; the layout needs to know who is
/// looking to draw the navigation.
pub fn page_context(viewer: &Viewer) -> Context {
    let mut ctx = Context::new();
    ctx.insert("viewer", &viewer.user().map(|u| u.username.as_str()));
    ctx
}
