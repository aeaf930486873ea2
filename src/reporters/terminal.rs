use colored::Colorize;
use comfy_table::{Table, Cell, Color, Attribute, presets::UTF8_FULL};
use crate::types::{BusinessValue, Complexity, FeatureStatus, ReportPayload, RiskLevel};

const MAX_FEATURE_ROWS: usize = 15;

pub fn report_terminal(payload: &ReportPayload) {
    eprintln!();
    println!(
        "{} — {} ({} commits, {} features, {} developers)",
        "📋 git-brief".cyan().bold(),
        payload.meta.project_name.bold(),
        payload.commits.len().to_string().bright_black(),
        payload.features.len().to_string().bright_black(),
        payload.developer_profiles.len().to_string().bright_black(),
    );
    println!(
        "   Health: {}   Overall risk: {}",
        health_label(&payload.project_health.rating),
        level_label(payload.risk_assessment.overall_risk_level),
    );
    if let Some(t) = &payload.project_timeline {
        println!(
            "   {}",
            format!(
                "{} → {} ({} days)",
                t.start_date.format("%Y-%m-%d"),
                t.end_date.format("%Y-%m-%d"),
                t.duration_days
            )
            .bright_black()
        );
    }
    println!();

    // ── Risks ───────────────────────────────────────────────────────────────
    let risks: Vec<_> = payload.risk_assessment.all_risks().collect();
    if risks.is_empty() {
        println!("{}", "  No risks identified.".green());
    } else {
        println!("{}", "⚠️  Risks".yellow().bold());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["ID", "RISK", "SCORE", "MITIGATION"]);
        for r in &risks {
            table.add_row(vec![
                Cell::new(&r.id),
                Cell::new(&r.name),
                score_cell(r.risk_score),
                Cell::new(truncate(&r.mitigation_strategy, 60)).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }
    if !payload.risk_assessment.unevaluated_checks.is_empty() {
        println!(
            "{}",
            format!("   Not evaluated: {}", payload.risk_assessment.unevaluated_checks.join(", ")).bright_black()
        );
    }
    println!();

    // ── Features ────────────────────────────────────────────────────────────
    if payload.features.is_empty() {
        println!("{}", "  No features identified.".yellow());
    } else {
        println!("{}", "🧩 Features".cyan().bold());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["FEATURE", "STATUS", "COMPLEXITY", "HOURS", "VALUE", "RISK"]);
        for f in payload.features.iter().take(MAX_FEATURE_ROWS) {
            table.add_row(vec![
                Cell::new(truncate(&f.name, 40)),
                status_cell(f.status),
                complexity_cell(f.complexity),
                Cell::new(format!("{:.1}", f.estimated_hours)),
                value_cell(f.business_value),
                level_cell(f.risk_level),
            ]);
        }
        println!("{table}");
        if payload.features.len() > MAX_FEATURE_ROWS {
            println!(
                "{}",
                format!("   … {} more in the full report", payload.features.len() - MAX_FEATURE_ROWS).bright_black()
            );
        }
        if let Some(fc) = &payload.feature_complexity {
            println!(
                "   Estimated effort: {} hours ({} per feature)",
                format!("{:.1}", fc.total_estimated_hours).bold(),
                format!("{:.1}", fc.average_hours_per_feature),
            );
        }
    }
    println!();

    // ── Developers ──────────────────────────────────────────────────────────
    if !payload.developer_profiles.is_empty() {
        println!("{}", "👥 Developers".cyan().bold());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["DEVELOPER", "ROLE", "SKILL", "VALUE", "PATTERN"]);
        for d in &payload.developer_profiles {
            table.add_row(vec![
                Cell::new(&d.name),
                Cell::new(&d.role),
                Cell::new(d.skill_level.to_string()),
                value_cell(d.business_value),
                Cell::new(&d.contribution_pattern).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }

    if let Some(team) = &payload.team_analysis {
        let d = &team.dynamics;
        println!(
            "   Bus factor: {}   Model: {}   Stability: {}",
            bus_factor_label(d.bus_factor),
            d.collaboration_model,
            d.team_stability,
        );
    }
    println!();
}

// ─── Cell builders ────────────────────────────────────────────────────────────

fn score_cell(score: f64) -> Cell {
    let text = format!("{score:.2}");
    match score {
        s if s >= 0.7 => Cell::new(text).fg(Color::Red).add_attribute(Attribute::Bold),
        s if s >= 0.4 => Cell::new(text).fg(Color::Yellow),
        _             => Cell::new(text).fg(Color::Green),
    }
}

fn status_cell(status: FeatureStatus) -> Cell {
    match status {
        FeatureStatus::Completed  => Cell::new("✓ completed").fg(Color::Green),
        FeatureStatus::InProgress => Cell::new("… in progress").fg(Color::Yellow),
        FeatureStatus::Planned    => Cell::new("○ planned").fg(Color::DarkGrey),
    }
}

fn complexity_cell(c: Complexity) -> Cell {
    match c {
        Complexity::High   => Cell::new("high").fg(Color::Red),
        Complexity::Medium => Cell::new("medium").fg(Color::Yellow),
        Complexity::Low    => Cell::new("low"),
    }
}

fn value_cell(v: BusinessValue) -> Cell {
    match v {
        BusinessValue::Critical => Cell::new("Critical").fg(Color::Magenta).add_attribute(Attribute::Bold),
        BusinessValue::High     => Cell::new("High").fg(Color::Cyan),
        other                   => Cell::new(other.to_string()),
    }
}

fn level_cell(level: RiskLevel) -> Cell {
    match level {
        RiskLevel::High   => Cell::new("🔴 HIGH").fg(Color::Red),
        RiskLevel::Medium => Cell::new("🟡 MEDIUM").fg(Color::Yellow),
        RiskLevel::Low    => Cell::new("🟢 LOW").fg(Color::Green),
    }
}

// ─── Other helpers ────────────────────────────────────────────────────────────

fn level_label(level: RiskLevel) -> colored::ColoredString {
    match level {
        RiskLevel::High   => "High".red().bold(),
        RiskLevel::Medium => "Medium".yellow(),
        RiskLevel::Low    => "Low".green(),
    }
}

fn health_label(rating: &str) -> colored::ColoredString {
    match rating {
        "Excellent" | "Good" => rating.green().bold(),
        "Fair"               => rating.yellow(),
        _                    => rating.red(),
    }
}

fn bus_factor_label(n: usize) -> colored::ColoredString {
    if n <= 1 { n.to_string().red().bold() } else { n.to_string().normal() }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
