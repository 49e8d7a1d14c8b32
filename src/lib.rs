/*!
# Pixel Matrix

Storage and visualization core for a pixel-art web application.

## Overview

Drawings are stored as flat lists of `(row, column, color)` pixels. To show
how a drawing is laid out in memory, the pixels are loaded into a
**sparse matrix**: only populated coordinates get a node, every node is
linked to its neighbours in the same row and the same column, and each
populated row and column gets a header node anchoring its chain. The
matrix is then exported as a directed graph and handed to Graphviz.

## Architecture

### Core
- **header**: ascending doubly-linked header lists (one per axis)
- **cell**: interior cell nodes with four-way links
- **matrix**: the sparse matrix and its insertion algorithm
- **graph**: graph export and DOT serialization

### Application
- **color**: hex/RGB conversion, grayscale and sepia filters
- **image**: pixel and image models
- **figure**: parsing of uploaded figure documents
- **roster**: user profiles, bulk user lists, XML export
- **store**: gzip + bincode gallery persistence and per-user statistics
- **render**: external Graphviz renderer
- **config**: environment-driven settings
- **login** / **app** (feature `web`): accounts, sessions, HTTP routes

## Design Highlights

- Arena-backed nodes addressed by index handles, no reference counting
- First value written at a coordinate is permanent
- Deterministic export: equal pixel sets give byte-identical DOT

## REST API Endpoints (feature `web`)

- `POST /auth/register`, `POST /auth/login`, `POST /auth/logout`
- `POST /images` - Upload a figure document
- `GET /images` - List the caller's images
- `GET /images/{id}/graph` - Rendered matrix graph
- `GET /images/{id}/graph.dot` - Matrix graph as DOT
- `POST /images/{id}/transform/{filter}` - Derive a grayscale/sepia copy
- `GET /statistics/top-users` - Three users with the most images
- `GET /statistics/edited-images` - Edited images per user
- `GET /users`, `GET /users/{id}` - Account profiles
- `POST /users/bulk-upload` - Create accounts from a user list document
- `GET /export/xml` - All users with their images as XML
*/

pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod figure;
pub mod graph;
pub mod header;
pub mod image;
pub mod matrix;
pub mod render;
pub mod roster;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;

pub use cell::{CellId, CellNode};
pub use error::{PixelError, RenderError, Result};
pub use graph::{GraphDescription, GraphEdge, GraphNode, NodeKind};
pub use header::{HeaderId, HeaderList, HeaderNode};
pub use matrix::{Axis, SparseMatrix};
