// Copyright (C) 2025  certrefresh Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
// Command modules for the certrefresh CLI
pub mod delete;
pub mod info;
pub mod refresh;
pub mod upload;

pub use delete::DeleteCmd;
pub use info::InfoCmd;
pub use refresh::RefreshCmd;
pub use upload::UploadCmd;
