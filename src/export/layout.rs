//! Standard manuscript layout.

use super::docx::{Align, Document, PageStyle, Paragraph};
use crate::store::{Chapter, Project};
use crate::utils::text::group_thousands;

const SAMPLE_CHAPTERS: usize = 3;
const MISSING_CONTENT: &str = "[Chapter content to be added]";

/// Word count as shown on a title page: nearest thousand above 1,000, with
/// halves going to the even thousand.
pub fn rounded_word_count(words: usize) -> usize {
    if words <= 1000 {
        return words;
    }
    let (thousands, rest) = (words / 1000, words % 1000);
    let up = rest > 500 || (rest == 500 && thousands % 2 == 1);
    (thousands + usize::from(up)) * 1000
}

fn author(project: &Project) -> &str {
    if project.author_name.trim().is_empty() {
        "Author Name"
    } else {
        &project.author_name
    }
}

fn sorted_chapters(project: &Project) -> Vec<&Chapter> {
    let mut chapters: Vec<&Chapter> = project.chapters.iter().flatten().collect();
    chapters.sort_by_key(|c| c.order);
    chapters
}

fn title_page(doc: &mut Document, project: &Project) {
    let mut contact = vec![author(project).to_string()];
    for line in [&project.author_address, &project.author_email, &project.author_phone] {
        if !line.is_empty() {
            contact.push(line.clone());
        }
    }
    if !project.agent_name.is_empty() {
        contact.push(format!("Agent: {}", project.agent_name));
    }
    doc.push(Paragraph::flush(contact.join("\n")).single_spaced());
    doc.push(
        Paragraph::flush(format!("Approx. {} words", group_thousands(rounded_word_count(project.word_count))))
            .align(Align::Right),
    );

    doc.spacer(10);
    doc.push(Paragraph::centered(project.title.to_uppercase()));
    if !project.subtitle.is_empty() {
        doc.push(Paragraph::centered(project.subtitle.clone()));
    }
    doc.push(Paragraph::centered(format!("by\n{}", author(project))));
    doc.page_break();
}

/// A chapter opens a third of the way down the page; `###` and `* * *`
/// lines become a centered `#` scene break.
fn chapter_body(doc: &mut Document, chapter: &Chapter, placeholder: Option<&str>) {
    doc.spacer(4);
    doc.push(Paragraph::centered(format!("Chapter {}: {}", chapter.order, chapter.title)).space_after_pt(24));

    let content = match placeholder {
        Some(text) if chapter.content.trim().is_empty() => text,
        _ => chapter.content.as_str(),
    };
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line == "###" || line == "* * *" {
            doc.push(Paragraph::centered("#"));
        } else {
            doc.push(Paragraph::new(line));
        }
    }
}

/// Title page, every chapter in order, and the closing `# # #`.
pub fn manuscript_document(project: &Project) -> Document {
    let mut doc = Document::new(PageStyle::default());
    title_page(&mut doc, project);

    let chapters = sorted_chapters(project);
    for (i, chapter) in chapters.iter().enumerate() {
        chapter_body(&mut doc, chapter, None);
        if i + 1 < chapters.len() {
            doc.page_break();
        }
    }

    doc.push(Paragraph::centered("# # #").space_before_pt(48));
    doc
}

/// Title page and the first three chapters; empty chapters get a placeholder.
pub fn sample_chapters_document(project: &Project) -> Document {
    let mut doc = Document::new(PageStyle::default());
    title_page(&mut doc, project);

    let chapters = sorted_chapters(project);
    let sample = &chapters[..chapters.len().min(SAMPLE_CHAPTERS)];
    for (i, chapter) in sample.iter().enumerate() {
        chapter_body(&mut doc, chapter, Some(MISSING_CONTENT));
        if i + 1 < sample.len() {
            doc.page_break();
        }
    }
    doc
}

/// Plain text in manuscript style under an optional bold centered title.
pub fn text_document(text: &str, title: &str) -> Document {
    let mut doc = Document::new(PageStyle::default());
    if !title.is_empty() {
        doc.push(Paragraph::centered(title).bold().space_after_pt(24));
    }
    for line in text.split('\n') {
        if line.trim().is_empty() {
            doc.push(Paragraph::new(""));
        } else {
            doc.push(Paragraph::flush(line.trim()));
        }
    }
    doc
}
