//! Self-contained HTML document for a [`Report`], generated with
//! `quick-xml`'s writer so every cell is escaped.

use std::io::Cursor;

use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
  Error, Result,
  model::{Report, format_score},
};

const STYLE: &str = "
body { font-family: sans-serif; font-size: 11px; color: #222; }
h1 { font-size: 18px; margin-bottom: 4px; }
.cards { display: flex; gap: 8px; margin: 12px 0; }
.card { border: 1px solid #ccc; border-radius: 4px; padding: 6px 10px; }
table { border-collapse: collapse; width: 100%; margin-bottom: 6px; }
th, td { border: 1px solid #ccc; padding: 3px 5px; text-align: left; }
th { background: #f0f0f0; }
.chunk { page-break-after: always; }
.chunk-summary { color: #555; }
";

type Xml = Writer<Cursor<Vec<u8>>>;

pub fn to_html(report: &Report) -> Result<String> {
  let mut w = Writer::new(Cursor::new(Vec::new()));

  emit(&mut w, Event::DocType(BytesText::from_escaped("html")))?;
  write_start_attrs(&mut w, "html", &[("lang", "pt-BR")])?;

  write_start(&mut w, "head")?;
  emit(&mut w, Event::Empty(BytesStart::new("meta").with_attributes([("charset", "utf-8")])))?;
  write_text_elem(&mut w, "title", &report.title)?;
  write_text_elem(&mut w, "style", STYLE)?;
  write_end(&mut w, "head")?;

  let orientation = report.orientation.to_string();
  write_start_attrs(&mut w, "body", &[("data-orientation", orientation.as_str())])?;
  write_text_elem(&mut w, "h1", &report.title)?;
  write_text_elem(
    &mut w,
    "p",
    &format!("Gerado em {}", report.generated_at.format("%d/%m/%Y %H:%M")),
  )?;
  write_summary(&mut w, report)?;

  for chunk in &report.chunks {
    write_start_attrs(&mut w, "section", &[("class", "chunk")])?;
    write_text_elem(&mut w, "h2", &format!("Página {}", chunk.number))?;

    write_start(&mut w, "table")?;
    write_start(&mut w, "thead")?;
    write_start(&mut w, "tr")?;
    for label in &report.columns {
      write_text_elem(&mut w, "th", label)?;
    }
    write_end(&mut w, "tr")?;
    write_end(&mut w, "thead")?;
    write_start(&mut w, "tbody")?;
    for row in &chunk.rows {
      write_start(&mut w, "tr")?;
      for cell in row {
        write_text_elem(&mut w, "td", cell)?;
      }
      write_end(&mut w, "tr")?;
    }
    write_end(&mut w, "tbody")?;
    write_end(&mut w, "table")?;

    let mut line = format!("{} registros nesta página", chunk.count);
    if let Some(avg) = chunk.average_score {
      line.push_str(&format!(" · média {}", format_score(avg)));
    }
    write_start_attrs(&mut w, "p", &[("class", "chunk-summary")])?;
    emit(&mut w, Event::Text(BytesText::new(&line)))?;
    write_end(&mut w, "p")?;
    write_end(&mut w, "section")?;
  }

  write_end(&mut w, "body")?;
  write_end(&mut w, "html")?;
  Ok(String::from_utf8(w.into_inner().into_inner())?)
}

fn write_summary(w: &mut Xml, report: &Report) -> Result<()> {
  let s = &report.summary;
  write_start_attrs(w, "div", &[("class", "cards")])?;
  card(w, "Total", &s.count.to_string())?;
  if let Some(avg) = s.average_score {
    card(w, "Média geral", &format_score(avg))?;
  }
  for (status, n) in &s.by_status {
    card(w, &status.to_string(), &n.to_string())?;
  }
  for (category, n) in &s.by_category {
    card(w, category, &n.to_string())?;
  }
  write_end(w, "div")
}

fn card(w: &mut Xml, label: &str, value: &str) -> Result<()> {
  write_start_attrs(w, "div", &[("class", "card")])?;
  write_text_elem(w, "strong", value)?;
  emit(w, Event::Text(BytesText::new(&format!(" {label}"))))?;
  write_end(w, "div")
}

// ─── Writer helpers ──────────────────────────────────────────────────────────

fn emit(w: &mut Xml, event: Event<'_>) -> Result<()> {
  w.write_event(event).map_err(|e| Error::Html(e.to_string()))
}

fn write_start(w: &mut Xml, tag: &str) -> Result<()> {
  emit(w, Event::Start(BytesStart::new(tag)))
}

fn write_start_attrs(w: &mut Xml, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
  emit(w, Event::Start(BytesStart::new(tag).with_attributes(attrs.iter().copied())))
}

fn write_end(w: &mut Xml, tag: &str) -> Result<()> {
  emit(w, Event::End(BytesEnd::new(tag)))
}

fn write_text_elem(w: &mut Xml, tag: &str, text: &str) -> Result<()> {
  write_start(w, tag)?;
  emit(w, Event::Text(BytesText::new(text)))?;
  write_end(w, tag)
}
