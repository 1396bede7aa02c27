//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::CpuState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, trace and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_trace(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: registers, memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(19),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:03}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file, two columns of sixteen.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs: Vec<_> = app.cpu.registers().iter().collect();
    let last_write = match app.cpu.last_step().map(|s| s.effect) {
        Some(crate::cpu::Effect::Write { rd, .. }) => Some(rd),
        _ => None,
    };

    let cell = |(index, name, value): (usize, &'static str, i32)| {
        let style = if Some(index) == last_write {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if value != 0 {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!("{:>4} {:>11}", name, value), style)
    };

    let mut content: Vec<Line> = (0..16)
        .map(|row| Line::from(vec![cell(regs[row]), Span::raw("   "), cell(regs[row + 16])]))
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{}", app.cpu.pc()), Style::default().fg(Color::Yellow)),
        Span::raw("   Cycles: "),
        Span::styled(format!("{}", app.cpu.cycles()), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(format!("{:?}", app.cpu.state()), state_style(app.cpu.state())),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw data memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app.cpu
        .data_memory()
        .dump(app.mem_scroll, visible_rows)
        .into_iter()
        .map(|(addr, value)| {
            let style = if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{:03}: {:>11}", addr, value)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Data Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the most recent trace lines.
fn draw_trace(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let skip = app.trace.len().saturating_sub(visible_rows);

    let items: Vec<ListItem> = app.trace
        .iter()
        .skip(skip)
        .map(|line| ListItem::new(line.as_str()))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Trace ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for a CPU state.
fn state_style(state: CpuState) -> Style {
    match state {
        CpuState::Running => Style::default().fg(Color::Green),
        CpuState::Halted => Style::default().fg(Color::Cyan),
        CpuState::Faulted => Style::default().fg(Color::Red),
    }
}
