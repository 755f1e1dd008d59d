/*!
# Airdrop Tracker

A browser-based personal airdrop tracker, built in Rust.

## Overview

Users record crypto airdrop opportunities (deadlines, checklist tasks,
links, notes), watch each record's lifecycle status update as dates pass
and tasks get checked off, and move records in and out of the app through
CSV spreadsheets, a placeholder Telegram feed, and an assisted
text-extraction/research service.

## Architecture

The application follows a client-server architecture:

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Airdrop Collection Store - Maintains the in-memory record collection
  - Status Derivation Rule - Computes Upcoming/Active/Completed from dates and tasks
  - Filter/Search View - Status filter plus case-insensitive substring search
  - Import Adapter - Fixed-column sheet schema, both directions
  - Assist Boundary - External extraction/research service client
  - Error Handler - Validation, service and not-found errors as messages

### Data Persistence Layer
- File storage with Gzip compression and bincode serialization
- Per-user snapshot files and CSV export/import
- accounts.json account database with Argon2 password hashes

## Key Features

- CRUD over tracked airdrops with derived lifecycle status
- Checklist tasks per airdrop with completion toggling
- Case-insensitive search and status filtering
- CSV import/export with a fixed, header-checked column schema
- Assisted field extraction from pasted text and project research
- Placeholder Telegram feed as a bulk import source
- User authentication, guest sessions and per-user snapshots

## Modules

- **airdrop**: Record, task and input types plus form validation
- **status**: The pure status derivation rule
- **store**: Core module for collection management (mutations, view)
- **sheet**: Fixed-schema import/export and the CSV codec
- **saving**: Collection persistence with compression
- **assist**: Extraction/research service boundary and field mapping
- **telegram**: Placeholder announcement feed
- **login**: User authentication and session management
- **app**: Routing and handlers

## REST API Endpoints

- `/api/airdrops` - List (with `search`/`status` view parameters) and create
- `/api/airdrops/{id}` - Fetch, update, delete
- `/api/airdrops/{id}/tasks` - Add a checklist task
- `/api/airdrops/{id}/tasks/{task_id}/toggle` - Toggle task completion
- `/api/import/csv`, `/api/export/csv` - Spreadsheet round-trip
- `/api/import/telegram` - Ingest the sample feed
- `/api/assist/extract`, `/api/assist/research` - Assisted helpers
- `/api/save`, `/api/load` - Snapshot persistence
- `/signup`, `/login`, `/logout`, `/api/session/guest` - Sessions
*/

// Re-export all modules so they appear in the documentation
pub mod airdrop;
pub mod assist;
pub mod saving;
pub mod sheet;
pub mod status;
pub mod store;
pub mod telegram;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;

/// Re-export everything from these modules to make it easier to use
pub use airdrop::*;
pub use status::*;
pub use store::*;
