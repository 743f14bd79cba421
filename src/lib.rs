/*!
# Growth Mindset App

A single-page web app that helps a user practise a growth mindset, built in
Rust.

## Overview

The page lets a user:

- save a free-text goal,
- upload a CSV or Excel file, browse it as a table and chart two of its
  numeric columns,
- keep a numbered list of daily reflections,
- manage a list of tags,
- convert a CSV file to Excel or an Excel file to CSV and download it,
- read a random inspirational quote.

## Architecture

Every piece of user state lives in one [`session::SessionState`] per browser
session, looked up through an opaque cookie. Each action is a form post that
mutates that struct and redirects back to the page, which is rendered again
from the current state.

### Core (always built)
- **table**: In-memory dataset with per-column type inference
- **loader**: CSV / XLSX bytes to a table
- **downloader**: Table to CSV / XLSX bytes, file conversion
- **graph**: Two-series SVG line chart
- **session**: Per-session state and the session store
- **inspiration**: Quote list

### Web layer (`web` feature, on by default)
- **config**: Command-line and environment configuration
- **render**: Handlebars page template
- **app**: Routing, handlers and middleware

## HTTP Endpoints

- `GET /` - Renders the page
- `POST /goal`, `/reflections`, `/tags`, `/tags/remove` - Text actions
- `POST /upload` - Loads a table into the session
- `POST /chart`, `GET /chart.svg` - Chart column selection and image
- `POST /convert` - Returns the converted file as a download
- `POST /theme` - Dark / light theme
- `GET /api/state` - JSON snapshot of the session
*/

pub mod downloader;
pub mod error;
pub mod graph;
pub mod inspiration;
pub mod loader;
pub mod session;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod render;

/// Re-export the commonly used items to make the crate easier to use
pub use downloader::{Converted, convert, to_csv, to_xlsx};
pub use error::{ChartError, TableError};
pub use graph::{ChartOptions, line_chart};
pub use loader::{FileFormat, from_csv, from_xlsx, load_table};
pub use session::{Notice, NoticeLevel, SessionState, SessionStore};
pub use table::{Cell, Column, ColumnKind, Table};
