//! Entity namespaces and link declarations. Every relationship is a named
//! link with a forward and a reverse end; traversal code looks link ends up
//! by name rather than hard-coding key layouts.

pub const USERS: &str = "users";
pub const PROFILES: &str = "profiles";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";

pub const PROFILE_USER: &str = "profile_user";
pub const POST_AUTHOR: &str = "post_author";
pub const COMMENT_POST: &str = "comment_post";
pub const COMMENT_AUTHOR: &str = "comment_author";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug)]
pub struct LinkEnd {
    pub on: &'static str,
    pub has: Cardinality,
    pub label: &'static str,
}

#[derive(Debug)]
pub struct LinkDef {
    pub name: &'static str,
    pub forward: LinkEnd,
    pub reverse: LinkEnd,
}

pub static LINKS: &[LinkDef] = &[
    LinkDef {
        name: PROFILE_USER,
        forward: LinkEnd {
            on: PROFILES,
            has: Cardinality::One,
            label: "user",
        },
        reverse: LinkEnd {
            on: USERS,
            has: Cardinality::One,
            label: "profile",
        },
    },
    LinkDef {
        name: POST_AUTHOR,
        forward: LinkEnd {
            on: POSTS,
            has: Cardinality::One,
            label: "author",
        },
        reverse: LinkEnd {
            on: PROFILES,
            has: Cardinality::Many,
            label: "authoredPosts",
        },
    },
    LinkDef {
        name: COMMENT_POST,
        forward: LinkEnd {
            on: COMMENTS,
            has: Cardinality::One,
            label: "post",
        },
        reverse: LinkEnd {
            on: POSTS,
            has: Cardinality::Many,
            label: "comments",
        },
    },
    LinkDef {
        name: COMMENT_AUTHOR,
        forward: LinkEnd {
            on: COMMENTS,
            has: Cardinality::One,
            label: "author",
        },
        reverse: LinkEnd {
            on: PROFILES,
            has: Cardinality::Many,
            label: "authoredComments",
        },
    },
];

pub fn link(name: &str) -> Option<&'static LinkDef> {
    LINKS.iter().find(|l| l.name == name)
}

/// Links declared on `entity` (forward end).
pub fn forward_links(entity: &str) -> impl Iterator<Item = &'static LinkDef> + use<'_> {
    LINKS.iter().filter(move |l| l.forward.on == entity)
}

/// Links pointing at `entity` (reverse end).
pub fn reverse_links(entity: &str) -> impl Iterator<Item = &'static LinkDef> + use<'_> {
    LINKS.iter().filter(move |l| l.reverse.on == entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_lookup_by_name() {
        let l = link(POST_AUTHOR).unwrap();
        assert_eq!(l.forward.on, POSTS);
        assert_eq!(l.reverse.on, PROFILES);
        assert_eq!(l.reverse.has, Cardinality::Many);
        assert!(link("post_editor").is_none());
    }

    #[test]
    fn comments_declare_two_forward_links() {
        let names: Vec<_> = forward_links(COMMENTS).map(|l| l.name).collect();
        assert_eq!(names, vec![COMMENT_POST, COMMENT_AUTHOR]);
    }

    #[test]
    fn profiles_are_targeted_by_authored_content() {
        let labels: Vec<_> = reverse_links(PROFILES).map(|l| l.reverse.label).collect();
        assert_eq!(labels, vec!["authoredPosts", "authoredComments"]);
    }
}
