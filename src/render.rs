//! Markdown rendering of each result tab, with the same headings as the web UI.

use std::fmt::Write as _;

use serde::Serialize;

use crate::domain::{Activity, CaseStudy, EducationalResources, Infographic, Quiz, VideoScript};

/// One rendered document per tab.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownBundle {
  pub quiz: String,
  pub case_study: String,
  pub video_script: String,
  pub infographic: String,
  pub activity: String,
}

pub fn to_markdown(r: &EducationalResources) -> MarkdownBundle {
  MarkdownBundle {
    quiz: quiz_md(&r.quiz),
    case_study: case_study_md(&r.case_study),
    video_script: video_script_md(&r.video_script),
    infographic: infographic_md(&r.infographic),
    activity: activity_md(&r.activity),
  }
}

// `write!` into a String cannot fail; results are ignored below.

fn quiz_md(q: &Quiz) -> String {
  let mut out = format!("# {}\n", q.title);
  for (i, question) in q.questions.iter().enumerate() {
    let _ = write!(out, "\n## {}. {}\n\n", i + 1, question.question);
    for opt in &question.options {
      if *opt == question.correct_answer {
        let _ = writeln!(out, "- **{}** ✓", opt);
      } else {
        let _ = writeln!(out, "- {}", opt);
      }
    }
    let _ = write!(out, "\n> **Explication :** {}\n", question.explanation);
  }
  out
}

fn case_study_md(c: &CaseStudy) -> String {
  let mut out = format!("# {}\n\n## Scénario\n\n{}\n\n## Questions\n\n", c.title, c.scenario);
  for (i, q) in c.questions.iter().enumerate() {
    let _ = writeln!(out, "{}. {}", i + 1, q);
  }
  out
}

fn video_script_md(v: &VideoScript) -> String {
  let mut out = format!("# {}\n", v.title);
  for scene in &v.scenes {
    let _ = write!(
      out,
      "\n## Scène {}\n\n**Visuels :** {}\n\n**Narration :** {}\n",
      scene.scene_number, scene.visuals, scene.narration
    );
  }
  out
}

fn infographic_md(i: &Infographic) -> String {
  let mut out = format!("# {}\n\n", i.title);
  for kp in &i.key_points {
    let _ = writeln!(out, "- **{}**\n  - Suggestion Visuelle : {}", kp.point, kp.visual_suggestion);
  }
  out
}

fn activity_md(a: &Activity) -> String {
  let mut out = format!("# {}\n\n## Description\n\n{}\n\n## Étapes\n\n", a.title, a.description);
  for (i, step) in a.steps.iter().enumerate() {
    let _ = writeln!(out, "{}. {}", i + 1, step);
  }
  out.push_str("\n## Matériel Requis\n\n");
  for m in &a.materials {
    let _ = writeln!(out, "- {}", m);
  }
  out
}
