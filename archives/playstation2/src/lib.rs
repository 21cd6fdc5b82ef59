pub mod tm3;
