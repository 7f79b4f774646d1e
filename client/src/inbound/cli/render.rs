//! Plain-text views of screen state.

use std::io::{self, Write};

use crate::domain::routing::Sidebar;
use crate::domain::screens::{CourseModule, LearnScreen};
use crate::domain::{Identity, Route};

pub(super) fn sidebar(out: &mut impl Write, sidebar: &Sidebar) -> io::Result<()> {
    writeln!(out, "{}", sidebar.greeting)?;
    for item in &sidebar.items {
        writeln!(out, "  {:<14} {}", item.label, item.route.path())?;
    }
    Ok(())
}

pub(super) fn route(out: &mut impl Write, route: Route) -> io::Result<()> {
    writeln!(out, "{}", route.path())
}

pub(super) fn learn(out: &mut impl Write, screen: &LearnScreen) -> io::Result<()> {
    let selected_module = screen.selected_module().map(|module| module.id());
    writeln!(out, "Modules")?;
    for module in screen.modules() {
        let marker = if Some(module.id()) == selected_module { '*' } else { ' ' };
        writeln!(out, "{marker} {} [{}]", module.title(), module.id())?;
    }
    if screen.modules().is_empty() {
        writeln!(out, "  (none)")?;
    }

    let selected_chapter = screen.selected_chapter().map(|chapter| chapter.id());
    writeln!(out, "Chapters")?;
    for chapter in screen.chapters() {
        let marker = if Some(chapter.id()) == selected_chapter { '*' } else { ' ' };
        writeln!(out, "{marker} {} [{}]", chapter.title(), chapter.id())?;
    }
    if screen.chapters().is_empty() {
        writeln!(out, "  (none)")?;
    }

    if let Some(breadcrumb) = screen.breadcrumb() {
        writeln!(out, "{breadcrumb}")?;
    }
    if let Some(player) = screen.player() {
        match player.embed_url {
            Some(embed) => writeln!(out, "Video: {embed}")?,
            None => writeln!(out, "Video: {} (no playable id)", player.link)?,
        }
    }
    Ok(())
}

pub(super) fn course(out: &mut impl Write, course: &[CourseModule]) -> io::Result<()> {
    if course.is_empty() {
        return writeln!(out, "(no modules)");
    }
    for entry in course {
        writeln!(out, "{} [{}]", entry.module.title(), entry.module.id())?;
        for chapter in &entry.chapters {
            writeln!(
                out,
                "  - {} [{}] {} {}",
                chapter.title(),
                chapter.id(),
                chapter.status().as_str(),
                chapter.youtube_link()
            )?;
        }
    }
    Ok(())
}

pub(super) fn users(out: &mut impl Write, users: &[Identity]) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(out, "(no users)");
    }
    for user in users {
        profile(out, user)?;
    }
    Ok(())
}

pub(super) fn profile(out: &mut impl Write, identity: &Identity) -> io::Result<()> {
    let role = identity.role().map_or("-", |role| role.as_str());
    writeln!(
        out,
        "{} <{}> {role} [{}]",
        identity.name(),
        identity.email(),
        identity.id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routing::navigation;
    use crate::domain::{
        Chapter, ChapterDraft, ChapterId, ChapterStatus, ChapterTitle, Module, ModuleId,
        ModuleTitle, Role, VideoLink,
    };
    use crate::test_support::identity;
    use rstest::rstest;

    fn text(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).expect("write to buffer");
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[rstest]
    fn sidebar_lists_greeting_then_items() {
        let ada = identity(
            "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "Ada",
            "ada@example.com",
            Some(Role::User),
        );

        let output = text(|out| sidebar(out, &navigation(Some(&ada))));

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "Hello, Ada");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("/dashboard/settings"));
    }

    #[rstest]
    fn course_lists_chapters_under_modules() {
        let module = Module::new(
            ModuleId::new("m1").expect("valid id"),
            ModuleTitle::new("Intro").expect("valid title"),
        );
        let chapter = Chapter::new(
            ChapterId::new("c1").expect("valid id"),
            ChapterDraft {
                title: ChapterTitle::new("Welcome").expect("valid title"),
                module_id: ModuleId::new("m1").expect("valid id"),
                youtube_link: VideoLink::new("https://youtu.be/abcdefghijk").expect("valid link"),
                status: ChapterStatus::Live,
            },
        );
        let entry = CourseModule {
            module,
            chapters: vec![chapter],
        };

        let output = text(|out| course(out, &[entry]));

        assert_eq!(
            output,
            "Intro [m1]\n  - Welcome [c1] live https://youtu.be/abcdefghijk\n"
        );
    }

    #[rstest]
    fn profile_without_role_shows_placeholder() {
        let bob = identity(
            "9b2f7f3c-1d7e-4e0a-9c55-6d0f1a2b3c4d",
            "Bob",
            "bob@example.com",
            None,
        );

        let output = text(|out| profile(out, &bob));

        assert_eq!(
            output,
            "Bob <bob@example.com> - [9b2f7f3c-1d7e-4e0a-9c55-6d0f1a2b3c4d]\n"
        );
    }
}
