use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Row, Table, TableState};
use tracing::{info, warn};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;
use unenroll_core::{
    Enrollment, EnrollmentStore, FlowEffects, ModalPhase, ReasonCatalog, UnenrollFlow,
    Unenrollment,
};

use crate::UiExit;
use crate::keymap;
use crate::theme;
use crate::ui::binary_choice::{BinaryChoice, BinaryChoiceEvent};
use crate::ui::modal::{ModalSpec, body_row_starting_with, render_error_modal, render_modal};
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, label_value_line, option_line,
    wrapped_paragraph,
};

const CUSTOM_INPUT_LABEL: &str = "Other reason";

pub(crate) trait DashboardOps {
    fn list_enrollments(&self) -> Result<Vec<Enrollment>>;
    fn unenroll_course(&self, course_id: &str) -> Result<Unenrollment>;
    fn save_reason(&self, course_id: &str, reason: Option<&str>, skipped: bool) -> Result<()>;
}

impl DashboardOps for EnrollmentStore {
    fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        self.list().with_context(|| {
            format!("failed to load enrollments from {}", self.path().display())
        })
    }

    fn unenroll_course(&self, course_id: &str) -> Result<Unenrollment> {
        self.unenroll(course_id)
            .with_context(|| format!("failed to unenroll from '{course_id}'"))
    }

    fn save_reason(&self, course_id: &str, reason: Option<&str>, skipped: bool) -> Result<()> {
        self.record_reason(course_id, reason, skipped)
            .with_context(|| format!("failed to record unenroll reason for '{course_id}'"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingReason {
    course_id: String,
    reason: Option<String>,
    skipped: bool,
}

/// View-side collaborators of the unenroll flow.
///
/// Closing hides the modal. Refreshing saves the staged reason and reloads
/// the enrollment table; a failure is kept for the error modal.
struct DashboardEffects<O: DashboardOps> {
    ops: O,
    rows: Vec<Enrollment>,
    modal_target: Option<Enrollment>,
    pending_reason: Option<PendingReason>,
    error: Option<String>,
}

impl<O: DashboardOps> DashboardEffects<O> {
    /// Reloads the rows even when saving the reason failed; the first error wins.
    fn reload(&mut self) -> Result<()> {
        let saved = match self.pending_reason.take() {
            Some(pending) => self.ops.save_reason(
                &pending.course_id,
                pending.reason.as_deref(),
                pending.skipped,
            ),
            None => Ok(()),
        };
        let listed = self.ops.list_enrollments().map(|rows| {
            self.rows = rows;
        });
        saved.and(listed)
    }
}

impl<O: DashboardOps> FlowEffects for DashboardEffects<O> {
    fn close_modal(&mut self) {
        self.modal_target = None;
    }

    fn refresh_enrollment_list(&mut self) -> Result<()> {
        let result = self.reload();
        if let Err(error) = &result {
            self.error = Some(format!("Refreshing enrollments failed.\n\n{error:#}"));
        }
        result
    }
}

pub(crate) struct DashboardScreen<O: DashboardOps> {
    flow: UnenrollFlow<DashboardEffects<O>>,
    catalog: ReasonCatalog,
    selected: usize,
    confirm_choice: BinaryChoice,
    reason_cursor: usize,
    custom_input: Input,
    custom_focused: bool,
}

impl<O: DashboardOps> DashboardScreen<O> {
    pub(crate) fn new(ops: O, catalog: ReasonCatalog) -> Result<Self> {
        let rows = ops.list_enrollments()?;
        Ok(Self {
            flow: UnenrollFlow::new(DashboardEffects {
                ops,
                rows,
                modal_target: None,
                pending_reason: None,
                error: None,
            }),
            catalog,
            selected: 0,
            confirm_choice: BinaryChoice::default(),
            reason_cursor: 0,
            custom_input: Input::default(),
            custom_focused: false,
        })
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if self.flow.effects().error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.flow.effects_mut().error = None;
            }
            return None;
        }

        if self.flow.effects().modal_target.is_none() {
            return self.on_key_list(key);
        }

        match self.flow.modal_phase() {
            ModalPhase::Confirm => self.on_key_confirm(key),
            ModalPhase::Reason => self.on_key_reason(key),
            ModalPhase::Finished => self.on_key_finished(key),
        }
        self.clamp_selection();
        None
    }

    fn on_key_list(&mut self, key: KeyEvent) -> Option<UiExit> {
        if keymap::is_back(key) || keymap::is_quit(key) {
            return Some(UiExit::Completed);
        }

        if keymap::is_up(key) {
            self.selected = self.selected.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.selected + 1 < self.flow.effects().rows.len() {
                self.selected += 1;
            }
        } else if keymap::is_confirm(key) {
            self.open_modal();
        }
        None
    }

    fn open_modal(&mut self) {
        let Some(row) = self.flow.effects().rows.get(self.selected).cloned() else {
            return;
        };

        self.confirm_choice.reset();
        self.reason_cursor = 0;
        self.custom_input = Input::default();
        self.custom_focused = false;
        self.flow.effects_mut().modal_target = Some(row);
    }

    fn on_key_confirm(&mut self, key: KeyEvent) {
        match self.confirm_choice.on_key(key) {
            BinaryChoiceEvent::ConfirmYes => self.confirm_unenroll(),
            BinaryChoiceEvent::ConfirmNo | BinaryChoiceEvent::Back => self.flow.close(),
            BinaryChoiceEvent::Continue => {}
        }
    }

    fn confirm_unenroll(&mut self) {
        let Some(target) = self.flow.effects().modal_target.clone() else {
            return;
        };

        match self.flow.effects().ops.unenroll_course(&target.course_id) {
            Ok(_) => {
                info!(course_id = %target.course_id, "unenrolled from course");
                self.flow.confirm();
            }
            Err(error) => {
                warn!(course_id = %target.course_id, "unenroll failed: {error:#}");
                self.flow.effects_mut().error = Some(format!("Unenroll failed.\n\n{error:#}"));
                self.flow.close();
            }
        }
    }

    fn on_key_reason(&mut self, key: KeyEvent) {
        if self.custom_focused {
            self.on_key_custom_input(key);
            return;
        }

        if keymap::is_back(key) {
            self.flow.close_and_refresh();
        } else if keymap::is_up(key) {
            self.reason_cursor = self.reason_cursor.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.reason_cursor + 1 < self.catalog.len() {
                self.reason_cursor += 1;
            }
        } else if keymap::is_toggle(key) {
            self.select_reason_under_cursor();
        } else if keymap::is_focus_switch(key) {
            self.custom_focused = self.custom_selected();
        } else if keymap::is_skip(key) {
            if let Some(reason) = self.flow.reason_mut() {
                reason.skip();
            }
            self.stage_pending_reason();
        } else if keymap::is_confirm(key) {
            self.submit_reason();
        }
    }

    fn on_key_custom_input(&mut self, key: KeyEvent) {
        if keymap::is_back(key) || keymap::is_focus_switch(key) {
            self.custom_focused = false;
            return;
        }

        if keymap::is_confirm(key) {
            self.submit_reason();
            return;
        }

        if self.custom_input.handle_event(&Event::Key(key)).is_some() {
            let text = self.custom_input.value().to_string();
            if let Some(reason) = self.flow.reason_mut() {
                reason.set_custom_option(text);
            }
        }
    }

    fn select_reason_under_cursor(&mut self) {
        let Some(option) = self.catalog.get(self.reason_cursor) else {
            return;
        };
        let key = option.key.clone();
        let is_custom = key.is_custom();

        if let Some(reason) = self.flow.reason_mut() {
            reason.select_option(key);
        }
        self.custom_focused = is_custom;
    }

    fn custom_selected(&self) -> bool {
        self.flow
            .reason()
            .selected()
            .is_some_and(|key| key.is_custom())
    }

    fn can_submit(&self) -> bool {
        let reason = self.flow.reason();
        match reason.selected() {
            None => false,
            Some(key) if key.is_custom() => !reason.custom_option().trim().is_empty(),
            Some(_) => true,
        }
    }

    fn submit_reason(&mut self) {
        if !self.can_submit() {
            return;
        }

        if let Some(reason) = self.flow.reason_mut() {
            reason.submit();
        }
        self.custom_focused = false;
        self.stage_pending_reason();
    }

    fn stage_pending_reason(&mut self) {
        let Some(target) = self.flow.effects().modal_target.as_ref() else {
            return;
        };
        let reason = self.flow.reason();
        let pending = PendingReason {
            course_id: target.course_id.clone(),
            reason: reason.value().map(str::to_string),
            skipped: reason.is_skipped(),
        };
        self.flow.effects_mut().pending_reason = Some(pending);
    }

    fn on_key_finished(&mut self, key: KeyEvent) {
        if keymap::is_confirm(key) || keymap::is_back(key) {
            self.flow.close_and_refresh();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.flow.effects().rows.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        self.render_list(frame);

        if let Some(target) = self.flow.effects().modal_target.as_ref() {
            match self.flow.modal_phase() {
                ModalPhase::Confirm => self.render_confirm(frame, target),
                ModalPhase::Reason => self.render_reason(frame),
                ModalPhase::Finished => self.render_finished(frame, target),
            }
        }

        if let Some(message) = self.flow.effects().error.as_deref() {
            render_error_modal(frame, message, "Enter/Esc: continue");
        }
    }

    fn render_list(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Enter: unenroll    Up/Down or j/k: move    Esc/q: exit",
            "Enter: unenroll | j/k: move | q: exit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let rows = &self.flow.effects().rows;
        let title = wrapped_paragraph(focus_line(format!("{} active enrollments", rows.len())))
            .block(theme::chrome("My courses"));
        frame.render_widget(title, header);

        if rows.is_empty() {
            let empty = Paragraph::new("You are not enrolled in any course.")
                .block(theme::chrome("Enrollments"));
            frame.render_widget(empty, body);
        } else {
            let header =
                Row::new(["Course", "Title", "Enrolled"]).style(theme::table_header(Color::Cyan));
            let table = Table::new(
                rows.iter().map(|row| {
                    Row::new(vec![
                        row.course_id.clone(),
                        row.title.clone(),
                        row.enrolled_at.clone(),
                    ])
                }),
                [
                    Constraint::Length(24),
                    Constraint::Min(20),
                    Constraint::Length(26),
                ],
            )
            .header(header)
            .block(theme::chrome("Enrollments"))
            .row_highlight_style(theme::table_highlight(Color::Cyan))
            .highlight_symbol(">> ");

            let mut state = TableState::new();
            state.select(Some(self.selected));
            frame.render_stateful_widget(table, body, &mut state);
        }

        frame.render_widget(key_hint_paragraph(key_text).block(theme::key_block()), footer);
    }

    fn render_confirm(&self, frame: &mut Frame<'_>, target: &Enrollment) {
        let (keep_style, leave_style) = if self.confirm_choice.yes_selected() {
            (theme::secondary_text(), theme::table_highlight(Color::Red))
        } else {
            (theme::table_highlight(Color::Cyan), theme::secondary_text())
        };

        let body = Text::from(vec![
            focus_line("Are you sure you want to unenroll from this course?"),
            Line::from(""),
            label_value_line("Course", target.title.clone()),
            label_value_line("Course id", target.course_id.clone()),
            Line::from(""),
            Line::from(vec![
                Span::styled("[ Never mind ]", keep_style),
                Span::raw("    "),
                Span::styled("[ Unenroll ]", leave_style),
            ]),
        ]);

        render_modal(
            frame,
            ModalSpec {
                title: "Unenroll",
                title_style: theme::warning_prompt(),
                body,
                key_hint: "Left/Right or y/n: choose    Enter: confirm    Esc: cancel",
                width_pct: 70,
                height_pct: 40,
            },
        );
    }

    fn render_reason(&self, frame: &mut Frame<'_>) {
        let reason = self.flow.reason();
        let mut lines = vec![
            focus_line("What's the main reason you are unenrolling?"),
            Line::from(""),
        ];
        lines.extend(self.catalog.options().iter().enumerate().map(|(index, option)| {
            let chosen = reason.selected() == Some(&option.key);
            option_line(&option.label, index == self.reason_cursor, chosen)
        }));

        if self.custom_selected() {
            lines.push(Line::from(""));
            lines.push(label_value_line(
                CUSTOM_INPUT_LABEL,
                self.custom_input.value().to_string(),
            ));
        }

        let key_hint = if self.custom_focused {
            "Type: reason    Enter: submit    Tab/Esc: back to options"
        } else if self.can_submit() {
            "Space: choose    Enter: submit    s: skip    Esc: close"
        } else {
            "Space: choose    s: skip    Esc: close"
        };

        let body_area = render_modal(
            frame,
            ModalSpec {
                title: "Tell us why",
                title_style: theme::focus_prompt(),
                body: Text::from(lines),
                key_hint,
                width_pct: 76,
                height_pct: 70,
            },
        );

        if self.custom_focused {
            self.place_input_cursor(frame, body_area);
        }
    }

    /// Option labels wrap on narrow screens, so the input row is located in
    /// the rendered body rather than counted from the line list.
    fn place_input_cursor(&self, frame: &mut Frame<'_>, body_area: Rect) {
        let prefix = format!("{CUSTOM_INPUT_LABEL}: ");
        let Some(y) = body_row_starting_with(frame.buffer_mut(), body_area, &prefix) else {
            return;
        };
        let x = body_area.x as usize
            + 1
            + prefix.chars().count()
            + self.custom_input.visual_cursor();
        let right = body_area.x as usize + body_area.width.saturating_sub(1) as usize;
        if x < right {
            frame.set_cursor_position((x as u16, y));
        }
    }

    fn render_finished(&self, frame: &mut Frame<'_>, target: &Enrollment) {
        let reason = self.flow.reason();
        let summary = match reason.value() {
            Some(value) => label_value_line("Reason", self.catalog.label_for(value).to_string()),
            None => label_value_line("Reason", "skipped"),
        };

        let body = Text::from(vec![
            Line::from(format!("You are unenrolled from '{}'.", target.title)),
            Line::from(""),
            summary,
            Line::from(""),
            Line::from("Thank you for letting us know."),
        ]);

        render_modal(
            frame,
            ModalSpec {
                title: "Unenrolled",
                title_style: theme::success_prompt(),
                body,
                key_hint: "Enter/Esc: return to my courses",
                width_pct: 70,
                height_pct: 36,
            },
        );
    }
}
